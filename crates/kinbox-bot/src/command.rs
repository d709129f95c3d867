//! Splitting an incoming message into a command and its arguments.

/// What a message asks the bot to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    /// Submit a knowledge message. Holds the text to parse.
    Add(&'a str),
    List,
    Search(&'a str),
    /// Toggle the read flag of a record id.
    Read(&'a str),
    Help,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    /// `/name@bot args` style commands; anything else is a submission.
    ///
    /// `submit` is the configured submission token, `/add` by default. It is
    /// checked before the built-in names.
    pub fn parse(text: &'a str, submit: &str) -> Self {
        let Some(rest) = text.trim_start().strip_prefix('/') else {
            return Self::Add(text);
        };
        let (head, args) = rest
            .split_once(char::is_whitespace)
            .unwrap_or((rest, ""));
        let name = head.split('@').next().unwrap_or(head);

        if submit.strip_prefix('/') == Some(name) {
            return Self::Add(args);
        }

        match name {
            "start" => Self::Start,
            "list" => Self::List,
            "search" => Self::Search(args.trim()),
            "read" => Self::Read(args.trim()),
            "help" => Self::Help,
            other => Self::Unknown(other),
        }
    }
}
