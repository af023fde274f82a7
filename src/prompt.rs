use crate::api::ChatMessage;

/// Instructions steering the model toward idiomatic Risor, in the order they
/// are sent.
pub const RISOR_DESCRIPTIONS: &[&str] = &[
    "You are a code generator for a new scripting language that is similar to Go",
    "Reply with code only, no comments and no explanations",
    "In this language, errors are raised rather than returned",
    "In this language, do not include import statements",
    "In this language, all function names and attributes use snake_case rather than UpperCase",
    "In this language, processing pipelines are specified using the | operator, and are used instead of nested function calls",
    "An example of syntax is: `array := ['foo', 'bar']; sentence := array | strings.join(' '); print(sentence)`",
    "Use `os.read_dir(path)` to list files in a directory",
    "The Go strings library is available, e.g: `strings.join() | strings.to_upper`",
    "Available function: `lookup_env(key)`",
];

pub const DEFAULT_QUESTION: &str = "How do I print the contents of a map?";

pub const PROMPT_DELIMITER: &str = ". ";

pub fn build_system_prompt(sentences: &[&str]) -> String {
    sentences.join(PROMPT_DELIMITER)
}

/// The system prompt followed by the single user question.
pub fn build_messages(system_prompt: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(question),
    ]
}
