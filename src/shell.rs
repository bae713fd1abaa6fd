//! Interactive shell.
//!
//! Each line typed at the `pdfmerge>` prompt becomes one workspace event.
//! Positions are 1-based, as shown by `list`. The drag commands replay a
//! pointer gesture step by step; `mv` performs a whole gesture at once.

use anyhow::{Context, anyhow, bail};
use std::io::BufRead;

use crate::app::App;
use crate::engine::PdfEngine;
use crate::error::{PdfMergeError, Result};
use crate::list::EntryId;
use crate::output::{OutputFormatter, display_add_outcome, display_list};

const PROMPT: &str = "pdfmerge> ";

const HELP: &str = "\
Commands:
  add <file|glob>...    stage PDF files
  list | ls             show staged files
  rm <n>                remove the file at position n
  mv <from> <to>        move a file (drag and drop in one step)
  drag <n>              start dragging the file at position n
  over <n>              hover the dragged file over position n
  leave <n>             move the pointer off position n
  drop <n>              drop the dragged file on position n
  cancel                abandon the current drag
  clear                 remove all files (asks first)
  name [text]           set the output name (blank means \"merged\")
  merge [name]          merge staged files into <name>.pdf
  help                  show this help
  quit | exit           leave the shell";

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stage files.
    Add(Vec<String>),
    /// Show the list.
    List,
    /// Remove the file at a 1-based position.
    Remove(usize),
    /// Move a file between 1-based positions.
    Move {
        /// Position picked up.
        from: usize,
        /// Position dropped on.
        to: usize,
    },
    /// Start a drag at a 1-based position.
    DragStart(usize),
    /// Hover over a 1-based position.
    DragOver(usize),
    /// Leave a 1-based position.
    DragLeave(usize),
    /// Drop on a 1-based position.
    Drop(usize),
    /// Abandon the drag.
    DragCancel,
    /// Empty the list.
    Clear,
    /// Set the output name.
    Name(String),
    /// Merge, optionally setting the output name first.
    Merge(Option<String>),
    /// Show help.
    Help,
    /// Leave the shell.
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns an error for unknown commands and malformed arguments.
pub fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word.to_ascii_lowercase().as_str() {
        "add" => {
            if args.is_empty() {
                bail!("Usage: add <file|glob>...");
            }
            Command::Add(args.iter().map(|a| a.to_string()).collect())
        }
        "list" | "ls" => Command::List,
        "rm" | "remove" => Command::Remove(single_position(&args, "rm <n>")?),
        "mv" | "move" => match args.as_slice() {
            [from, to] => Command::Move {
                from: parse_position(from)?,
                to: parse_position(to)?,
            },
            _ => bail!("Usage: mv <from> <to>"),
        },
        "drag" => Command::DragStart(single_position(&args, "drag <n>")?),
        "over" => Command::DragOver(single_position(&args, "over <n>")?),
        "leave" => Command::DragLeave(single_position(&args, "leave <n>")?),
        "drop" => Command::Drop(single_position(&args, "drop <n>")?),
        "cancel" => Command::DragCancel,
        "clear" => Command::Clear,
        "name" => Command::Name(rest.to_string()),
        "merge" => Command::Merge((!rest.is_empty()).then(|| rest.to_string())),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("Unknown command: {other} (type 'help')")),
    };

    Ok(Some(command))
}

fn single_position(args: &[&str], usage: &str) -> anyhow::Result<usize> {
    match args {
        [arg] => parse_position(arg),
        _ => bail!("Usage: {usage}"),
    }
}

fn parse_position(arg: &str) -> anyhow::Result<usize> {
    let position: usize = arg
        .parse()
        .with_context(|| format!("Not a position: {arg}"))?;
    if position == 0 {
        bail!("Positions start at 1");
    }
    Ok(position)
}

/// Ask a yes/no question on `input`. Anything but `y`/`yes` is a no.
pub fn prompt_yes_no<R: BufRead>(formatter: &OutputFormatter, input: &mut R, prompt: &str) -> bool {
    formatter.prompt(&format!("{prompt} [y/N]: "));

    let mut response = String::new();
    match input.read_line(&mut response) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(response.trim().to_lowercase().as_str(), "y" | "yes"),
    }
}

/// Interactive session over an [`App`].
#[derive(Debug)]
pub struct Shell<E, R> {
    app: App<E>,
    input: R,
}

impl<E: PdfEngine, R: BufRead> Shell<E, R> {
    /// Create a shell reading commands from `input`.
    pub fn new(app: App<E>, input: R) -> Self {
        Self { app, input }
    }

    /// The application state.
    pub fn app(&self) -> &App<E> {
        &self.app
    }

    /// Read and execute commands until `quit` or end of input.
    ///
    /// Command failures are shown as alerts and do not end the session.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading the input fails.
    pub async fn run(&mut self) -> Result<()> {
        let formatter = self.app.formatter().clone();
        formatter.info(&format!(
            "{} v{} - type 'help' for commands",
            crate::NAME,
            crate::VERSION
        ));

        loop {
            formatter.prompt(PROMPT);

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                formatter.blank_line();
                break;
            }

            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    formatter.error(&err.to_string());
                    continue;
                }
            };

            if command == Command::Quit {
                break;
            }

            if let Err(err) = self.execute(command).await {
                tracing::debug!(error = %err, "command failed");
                formatter.error(&err.alert());
            }
        }

        Ok(())
    }

    /// Execute one command.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying workspace operation reports.
    pub async fn execute(&mut self, command: Command) -> Result<()> {
        let formatter = self.app.formatter().clone();

        match command {
            Command::Add(patterns) => {
                let outcome = self.app.add_paths(patterns).await?;
                display_add_outcome(&formatter, &outcome);
            }
            Command::List => self.show_list()?,
            Command::Remove(position) => {
                let entry = self.app.workspace_mut().remove_at(position - 1)?;
                formatter.success(&format!("Removed {}", entry.name()));
            }
            Command::Move { from, to } => {
                let (source, target) = (self.id_at(from)?, self.id_at(to)?);
                let workspace = self.app.workspace_mut();
                workspace.drag_start(source)?;
                workspace.drag_over(target);
                if workspace.drop_on(target)? {
                    self.show_list()?;
                }
            }
            Command::DragStart(position) => {
                let id = self.id_at(position)?;
                self.app.workspace_mut().drag_start(id)?;
                formatter.debug(&format!("Dragging position {position}"));
            }
            Command::DragOver(position) => {
                let id = self.id_at(position)?;
                if self.app.workspace_mut().drag_over(id) {
                    formatter.debug(&format!("Drop target: position {position}"));
                }
            }
            Command::DragLeave(position) => {
                let id = self.id_at(position)?;
                self.app.workspace_mut().drag_leave(id);
            }
            Command::Drop(position) => {
                let id = self.id_at(position)?;
                if self.app.workspace_mut().drop_on(id)? {
                    self.show_list()?;
                }
            }
            Command::DragCancel => self.app.workspace_mut().drag_end(),
            Command::Clear => {
                let assume_yes = self.app.config().assume_yes;
                let input = &mut self.input;
                let mut confirm =
                    |prompt: &str| assume_yes || prompt_yes_no(&formatter, &mut *input, prompt);
                if self.app.workspace_mut().clear_all(&mut confirm)? {
                    formatter.success("Removed all files");
                }
            }
            Command::Name(name) => {
                self.app.workspace_mut().set_output_name(name);
                formatter.info(&format!("Output: {}", self.app.artifact_name()));
            }
            Command::Merge(name) => {
                if let Some(name) = name {
                    self.app.workspace_mut().set_output_name(name);
                }
                let input = &mut self.input;
                let mut confirm = |prompt: &str| prompt_yes_no(&formatter, &mut *input, prompt);
                let outcome = self.app.merge_to_disk(&mut confirm).await?;
                self.app.report(&outcome)?;
            }
            Command::Help => formatter.info(HELP),
            Command::Quit => {}
        }

        Ok(())
    }

    fn show_list(&self) -> Result<()> {
        let view = self.app.workspace().view();
        if self.app.config().json {
            return self.app.formatter().json(&view);
        }
        display_list(self.app.formatter(), &view);
        Ok(())
    }

    fn id_at(&self, position: usize) -> Result<EntryId> {
        let list = self.app.workspace().list();
        list.get(position - 1)
            .map(|entry| entry.id())
            .ok_or(PdfMergeError::IndexOutOfRange {
                index: position - 1,
                len: list.len(),
            })
    }
}
