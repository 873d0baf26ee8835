//! Command registry and dispatch.

use std::collections::BTreeMap;
use std::str::FromStr;

use hearth_core::PageModel;
use hearth_core::error::{HearthError, Result};

/// Result of running one command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Tabular data (header row + data rows).
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Command produced no visible output.
    None,
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "home \[page\]").
    fn usage(&self) -> &str;

    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput>;
}

/// Registry of available commands.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in command.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        crate::page_commands::register_page_commands(&mut reg);
        crate::icon_commands::register_icon_commands(&mut reg);
        reg
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    /// Tokenize and run a command line. Command names are case-insensitive.
    pub fn execute(&self, line: &str, model: &mut PageModel) -> Result<CommandOutput> {
        let tokens = tokenize(line)?;
        let args: Vec<&str> = tokens.iter().map(String::as_str).collect();
        self.run(&args, model)
    }

    /// Run an already split command: `args[0]` is the name.
    pub fn run(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(CommandOutput::None);
        };
        let name = name.to_ascii_lowercase();
        if name == "help" {
            return Ok(self.help());
        }
        let cmd = self
            .commands
            .get(&name)
            .ok_or_else(|| HearthError::Command(format!("unknown command: {name}")))?;
        log::debug!("Running {name} {rest:?}");
        cmd.execute(rest, model)
    }

    fn help(&self) -> CommandOutput {
        CommandOutput::Table {
            headers: vec!["usage".to_string(), "description".to_string()],
            rows: self
                .commands
                .values()
                .map(|c| vec![c.usage().to_string(), c.description().to_string()])
                .collect(),
        }
    }
}

/// Split on whitespace; double quotes group words.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            },
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            },
            c => {
                current.push(c);
                started = true;
            },
        }
    }
    if in_quotes {
        return Err(HearthError::Command("unterminated quote".to_string()));
    }
    if started {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Argument `i`, or a usage error.
pub fn arg<'a>(args: &[&'a str], i: usize, usage: &str) -> Result<&'a str> {
    args.get(i)
        .copied()
        .ok_or_else(|| HearthError::Command(format!("usage: {usage}")))
}

/// Argument `i` parsed as `T`, or a usage error naming the bad value.
pub fn parse_arg<T: FromStr>(args: &[&str], i: usize, usage: &str) -> Result<T> {
    let raw = arg(args, i, usage)?;
    raw.parse()
        .map_err(|_| HearthError::Command(format!("invalid argument {raw:?}; usage: {usage}")))
}

pub fn parse_switch(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(HearthError::Command(format!("expected on/off, got {other}"))),
    }
}

/// Render output as terminal lines.
pub fn format_output(output: &CommandOutput) -> Vec<String> {
    match output {
        CommandOutput::Text(text) => text.lines().map(str::to_string).collect(),
        CommandOutput::Table { headers, rows } => {
            let mut lines = vec![headers.join(" | ")];
            lines.extend(rows.iter().map(|row| row.join(" | ")));
            lines
        },
        CommandOutput::None => Vec::new(),
    }
}
