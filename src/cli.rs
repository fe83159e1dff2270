use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::core::command::ToolCommand;
use crate::core::config::{Config, DEFAULT_CATALOG_FILE, DEFAULT_TOOL};
use crate::core::editor::{find_editor, installed_editors, open_in_editor, InstalledEditor};
use crate::core::error::BoardflowError;
use crate::core::event::{StreamKind, ToolEvent};
use crate::core::formatter::{
    format_board_line, format_editor_line, format_progress_line, format_search_results,
};
use crate::core::{catalog, create_sketch, runner};

#[derive(Debug, Parser)]
#[command(
    name = "boardflow",
    version,
    about = "arduino-cli workflow wrapper with a searchable board catalog"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Board catalog document
    #[arg(long, env = "BOARDFLOW_CATALOG", default_value = DEFAULT_CATALOG_FILE, global = true)]
    pub catalog: PathBuf,
    /// Board tool executable
    #[arg(long, env = "ARDUINO_CLI", default_value = DEFAULT_TOOL, global = true)]
    pub tool: PathBuf,
    /// Raise log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl GlobalArgs {
    pub fn to_config(&self) -> Config {
        Config::new(self.tool.clone(), self.catalog.clone())
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every board the tool knows and rewrite the catalog
    Refresh,
    /// Search the catalog by name or FQBN (case-insensitive)
    Search { query: Option<String> },
    /// Print the whole catalog
    Boards,
    /// Sketch management
    Sketch {
        #[command(subcommand)]
        action: SketchAction,
    },
    /// Compile a sketch for a board, streaming the tool output
    Compile(CompileArgs),
    /// Upload a compiled sketch to a serial port
    Upload(UploadArgs),
    /// List editors found on PATH
    Editors,
    /// Open a file in an installed editor, creating it when missing
    Edit(EditArgs),
    /// Interactive terminal session
    Shell,
    /// Line-oriented prompt without the terminal UI
    Repl,
}

#[derive(Debug, Subcommand)]
pub enum SketchAction {
    /// Create a new sketch directory
    New { name: String },
}

#[derive(Debug, Parser)]
pub struct CompileArgs {
    #[arg(short = 'b', long = "fqbn")]
    pub fqbn: String,
    pub sketch: PathBuf,
    /// Do not pass -v to the tool
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

#[derive(Debug, Parser)]
pub struct UploadArgs {
    #[arg(short = 'p', long = "port")]
    pub port: String,
    #[arg(short = 'b', long = "fqbn")]
    pub fqbn: String,
    pub sketch: PathBuf,
}

#[derive(Debug, Parser)]
pub struct EditArgs {
    pub file: PathBuf,
    /// Editor name or command; prompts when omitted
    #[arg(short = 'e', long = "editor")]
    pub editor: Option<String>,
}

pub fn compile_args_to_command(args: CompileArgs) -> ToolCommand {
    ToolCommand::Compile {
        sketch: args.sketch,
        fqbn: args.fqbn,
        verbose: !args.quiet,
    }
}

pub fn upload_args_to_command(args: UploadArgs) -> ToolCommand {
    ToolCommand::Upload {
        sketch: args.sketch,
        fqbn: args.fqbn,
        port: args.port,
    }
}

/// One line typed into the shell or REPL. The catalog and tool are fixed for
/// the session, so global flags are rejected here instead of being ignored.
#[derive(Debug, Parser)]
#[command(name = "boardflow", no_binary_name = true)]
struct SessionLine {
    #[command(subcommand)]
    command: Commands,
}

pub fn parse_line(line: &str) -> Result<Commands, String> {
    let tokens = shell_words::split(line).map_err(|err| err.to_string())?;
    if tokens.is_empty() {
        return Err("missing command, try 'help'".to_string());
    }

    let parsed = SessionLine::try_parse_from(tokens).map_err(|err| err.to_string())?;
    Ok(parsed.command)
}

/// Runs one non-interactive command, printing to stdout/stderr.
pub fn execute(command: Commands, config: &Config) -> Result<(), BoardflowError> {
    match command {
        Commands::Refresh => {
            let boards = catalog::refresh(config)?;
            println!(
                "Saved {} boards to {}",
                boards.len(),
                config.catalog_path().display()
            );
        }
        Commands::Search { query } => {
            let matches = catalog::search(config.catalog_path(), query.as_deref().unwrap_or(""))?;
            if !matches.is_empty() {
                println!("Matching Boards:");
            }
            for line in format_search_results(&matches) {
                println!("{line}");
            }
        }
        Commands::Boards => {
            for board in catalog::load(config.catalog_path())? {
                println!("{}", format_board_line(&board));
            }
        }
        Commands::Sketch {
            action: SketchAction::New { name },
        } => {
            let out = create_sketch(config, &name)?;
            print!("{out}");
            println!("Sketch created with filename {name}");
        }
        Commands::Compile(args) => {
            let fqbn = args.fqbn.clone();
            runner::run_streaming(config, &compile_args_to_command(args), print_event)?;
            println!("Compiled for {fqbn}");
        }
        Commands::Upload(args) => {
            let port = args.port.clone();
            runner::run_streaming(config, &upload_args_to_command(args), print_event)?;
            println!("Uploaded to {port}");
        }
        Commands::Editors => {
            let editors = installed_editors();
            if editors.is_empty() {
                return Err(BoardflowError::NoEditors);
            }
            println!("Installed Editors:");
            for (idx, editor) in editors.iter().enumerate() {
                println!("{}", format_editor_line(idx, editor));
            }
        }
        Commands::Edit(args) => {
            let editors = installed_editors();
            if editors.is_empty() {
                return Err(BoardflowError::NoEditors);
            }
            let editor = match &args.editor {
                Some(wanted) => find_editor(&editors, wanted).cloned().ok_or_else(|| {
                    BoardflowError::invalid(format!("editor '{wanted}' is not installed"))
                })?,
                None => {
                    let stdin = io::stdin();
                    let mut stdout = io::stdout();
                    choose_editor(&editors, &mut stdin.lock(), &mut stdout)?
                }
            };
            println!("Opening {} to edit {}...", editor.name, args.file.display());
            let status = open_in_editor(&editor, &args.file)?;
            if !status.success() {
                return Err(BoardflowError::ExternalTool {
                    exit_code: status.code(),
                    stderr: format!("{} exited with {status}", editor.name),
                });
            }
        }
        Commands::Shell | Commands::Repl => {
            return Err(BoardflowError::invalid("already in an interactive session"));
        }
    }

    Ok(())
}

fn print_event(event: &ToolEvent) {
    match event {
        ToolEvent::Line(StreamKind::Stdout, line) => println!("{line}"),
        ToolEvent::Line(StreamKind::Stderr, line) => eprintln!("{line}"),
        ToolEvent::Progress(progress) => println!("{}", format_progress_line(progress)),
        ToolEvent::Usage(_) | ToolEvent::Error(_) | ToolEvent::Exited(_) => {}
    }
}

/// Numbered prompt over `editors`; re-asks until a valid number is entered.
pub fn choose_editor<R, W>(
    editors: &[InstalledEditor],
    input: &mut R,
    output: &mut W,
) -> Result<InstalledEditor, BoardflowError>
where
    R: BufRead,
    W: Write,
{
    let to_err = |e: io::Error| BoardflowError::invalid(e);

    writeln!(output, "Available Editors:").map_err(to_err)?;
    for (idx, editor) in editors.iter().enumerate() {
        writeln!(output, "{}", format_editor_line(idx, editor)).map_err(to_err)?;
    }

    let mut line = String::new();
    loop {
        write!(output, "Select an editor (Enter number): ").map_err(to_err)?;
        output.flush().map_err(to_err)?;

        line.clear();
        if input.read_line(&mut line).map_err(to_err)? == 0 {
            return Err(BoardflowError::invalid("no editor selected"));
        }

        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=editors.len()).contains(&choice) => {
                return Ok(editors[choice - 1].clone());
            }
            Ok(_) => {
                writeln!(output, "Invalid choice. Please enter a valid number.").map_err(to_err)?
            }
            Err(_) => writeln!(output, "Invalid input. Please enter a number.").map_err(to_err)?,
        }
    }
}

pub const HELP_LINES: [&str; 11] = [
    "Commands:",
    "  refresh",
    "  search <query>",
    "  boards",
    "  sketch new <name>",
    "  compile --fqbn <fqbn> <sketch> [--quiet]",
    "  upload -p <port> --fqbn <fqbn> <sketch>",
    "  editors",
    "  edit <file> [--editor <name>]   (not available in the shell)",
    "  help",
    "  clear / exit",
];
