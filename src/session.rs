//! The dashboard menu and the state it carries between choices.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::console::Console;
use crate::error::PromptError;
use crate::error_display::user_message_from_load;
use crate::loader::{load_table, prompt_for_table, LoadedTable};
use crate::selector::select_columns;
use crate::summary::basic_understanding;
use crate::visualize::{create_visualizations, ChartOptions};
use crate::widgets::ChartViewer;
use crate::OpenOptions;

/// Settings every menu handler reads.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub open: OpenOptions,
    pub head_rows: usize,
    pub chart: ChartOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            open: OpenOptions::new(),
            head_rows: 5,
            chart: ChartOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Load,
    Analyze,
    Visualize,
    Exit,
}

impl MenuChoice {
    pub const ALL: [Self; 4] = [Self::Load, Self::Analyze, Self::Visualize, Self::Exit];

    pub fn from_input(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Load),
            "2" => Some(Self::Analyze),
            "3" => Some(Self::Visualize),
            "4" => Some(Self::Exit),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Load => "Load Data",
            Self::Analyze => "Basic Analysis",
            Self::Visualize => "Create Visualizations",
            Self::Exit => "Exit",
        }
    }
}

/// Whether the menu is shown again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The loaded table, if any. Replaced wholesale by each handler that changes it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    table: Option<LoadedTable>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: LoadedTable) -> Self {
        Self { table: Some(table) }
    }

    pub fn table(&self) -> Option<&LoadedTable> {
        self.table.as_ref()
    }

    /// Start from the table at `path`. A failed load is reported and yields an
    /// empty session.
    pub fn preload<R: BufRead, W: Write>(
        console: &mut Console<R, W>,
        path: &Path,
        options: &OpenOptions,
    ) -> Result<Session, PromptError> {
        match load_table(path, options) {
            Ok(frame) => {
                console.say("File loaded successfully.")?;
                Ok(Session::with_table(LoadedTable {
                    frame,
                    path: path.to_path_buf(),
                }))
            }
            Err(e) if e.is_not_found() => {
                console.say("Error: File not found.")?;
                Ok(Session::new())
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "preload failed");
                console.say(format!("Error loading file: {}", user_message_from_load(&e)))?;
                Ok(Session::new())
            }
        }
    }

    /// Run one menu choice and return the state to continue with.
    pub fn dispatch<R: BufRead, W: Write, V: ChartViewer + ?Sized>(
        self,
        choice: MenuChoice,
        console: &mut Console<R, W>,
        options: &SessionOptions,
        viewer: &mut V,
    ) -> Result<(Session, Flow), PromptError> {
        tracing::debug!(choice = choice.label(), loaded = self.table.is_some(), "menu choice");
        match choice {
            MenuChoice::Load => {
                let table = prompt_for_table(console, &options.open)?;
                Ok((Session::with_table(table), Flow::Continue))
            }
            MenuChoice::Exit => {
                console.say("Exiting program. Goodbye!")?;
                Ok((self, Flow::Exit))
            }
            MenuChoice::Analyze | MenuChoice::Visualize => {
                let table = match self.table {
                    Some(table) => table,
                    None => {
                        console.say("Please load data first!")?;
                        return Ok((Session::new(), Flow::Continue));
                    }
                };
                let table = if choice == MenuChoice::Analyze {
                    let frame = basic_understanding(console, &table.frame, options.head_rows)?;
                    LoadedTable {
                        frame,
                        path: table.path,
                    }
                } else {
                    let selection = select_columns(console, &table.frame)?;
                    create_visualizations(
                        console,
                        &table.frame,
                        &selection,
                        &options.chart,
                        viewer,
                    )?;
                    table
                };
                Ok((Session::with_table(table), Flow::Continue))
            }
        }
    }
}

fn print_menu<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &Session,
) -> Result<(), PromptError> {
    console.section("=== Data Analysis Dashboard ===")?;
    if let Some(table) = session.table() {
        console.say(format!(
            "Loaded: {} ({} rows)",
            table.path.display(),
            table.rows()
        ))?;
    }
    for (i, choice) in MenuChoice::ALL.iter().enumerate() {
        console.say(format!("{}. {}", i + 1, choice.label()))?;
    }
    Ok(())
}

/// Show the menu until Exit is chosen or input closes. Returns the final state.
/// A handler that runs out of attempts is reported and the menu is shown again
/// with the state from before it ran.
pub fn run_dashboard<R: BufRead, W: Write, V: ChartViewer + ?Sized>(
    console: &mut Console<R, W>,
    mut session: Session,
    options: &SessionOptions,
    viewer: &mut V,
) -> Result<Session, PromptError> {
    loop {
        print_menu(console, &session)?;
        let answer = match console.prompt("Select option (1-4): ") {
            Ok(answer) => answer,
            Err(PromptError::Closed) => {
                tracing::debug!("input closed, leaving dashboard");
                return Ok(session);
            }
            Err(e) => return Err(e),
        };
        let Some(choice) = MenuChoice::from_input(&answer) else {
            console.say("Invalid selection. Please try again.")?;
            continue;
        };
        // The current state survives end of input inside a handler.
        let (next, flow) = match session.clone().dispatch(choice, console, options, viewer) {
            Ok(step) => step,
            Err(PromptError::Closed) => {
                tracing::debug!("input closed inside a menu handler");
                return Ok(session);
            }
            Err(e @ PromptError::AttemptsExhausted { .. }) => {
                console.say(format!("{}. Returning to the menu.", e))?;
                continue;
            }
            Err(e) => return Err(e),
        };
        session = next;
        if flow == Flow::Exit {
            return Ok(session);
        }
    }
}
