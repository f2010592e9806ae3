// system instruction sent ahead of every text to summarize.
pub const PROMPT: &str = "Summarize the following text briefly.";
