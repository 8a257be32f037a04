//! Lexical analysis for the shell: splitting a raw input line into word
//! tokens and extracting the trailing background marker.

/// A parsed command line: the word tokens and whether the command was
/// flagged to run in the background with a trailing `&`.
///
/// Tokens are owned strings scoped to one loop iteration; they are never
/// empty. The `&` marker itself is not a token — parsing strips it and
/// records it in [`CommandLine::background`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// The word tokens, in order. Empty for blank or all-whitespace input.
    pub tokens: Vec<String>,
    /// True when the final token of the raw line was a literal `&`.
    pub background: bool,
}

/// Split a line into word tokens.
///
/// Delimiters are space, tab and newline; a run of delimiters counts as a
/// single separator, so no empty tokens are ever produced. Whitespace-only
/// input yields an empty vector.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in line.chars() {
        match ch {
            ' ' | '\t' | '\n' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

impl CommandLine {
    /// Tokenize a raw line and extract the background marker.
    ///
    /// A final token that is exactly `&` is removed and sets `background`.
    /// A lone `&` therefore parses to zero tokens with `background` set,
    /// which downstream treats as a silent no-op.
    pub fn parse(line: &str) -> Self {
        let mut tokens = split_into_tokens(line);
        let mut background = false;
        if tokens.last().is_some_and(|t| t == "&") {
            tokens.pop();
            background = true;
        }
        Self { tokens, background }
    }

    /// True when the line held no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Reconstruct the line as it is stored in history: tokens joined with
    /// single spaces, with `" &"` reappended for background commands.
    pub fn history_text(&self) -> String {
        let mut text = self.tokens.join(" ");
        if self.background {
            text.push_str(" &");
        }
        text
    }
}
