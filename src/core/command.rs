use std::path::PathBuf;

/// One invocation of the external board tool, rendered into argv by [`ToolCommand::to_args`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    ListBoards,
    NewSketch {
        name: String,
    },
    Compile {
        sketch: PathBuf,
        fqbn: String,
        verbose: bool,
    },
    Upload {
        sketch: PathBuf,
        fqbn: String,
        port: String,
    },
}

impl ToolCommand {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        match self {
            ToolCommand::ListBoards => {
                args.push("board".to_string());
                args.push("listall".to_string());
            }
            ToolCommand::NewSketch { name } => {
                args.push("sketch".to_string());
                args.push("new".to_string());
                args.push(name.clone());
            }
            ToolCommand::Compile {
                sketch,
                fqbn,
                verbose,
            } => {
                args.push("compile".to_string());
                args.push("--fqbn".to_string());
                args.push(fqbn.clone());
                args.push(sketch.display().to_string());
                if *verbose {
                    args.push("-v".to_string());
                }
            }
            ToolCommand::Upload { sketch, fqbn, port } => {
                args.push("upload".to_string());
                args.push("-p".to_string());
                args.push(port.clone());
                args.push("--fqbn".to_string());
                args.push(fqbn.clone());
                args.push(sketch.display().to_string());
            }
        }

        args
    }

    /// Short label used in logs and job headers.
    pub fn label(&self) -> &'static str {
        match self {
            ToolCommand::ListBoards => "board listall",
            ToolCommand::NewSketch { .. } => "sketch new",
            ToolCommand::Compile { .. } => "compile",
            ToolCommand::Upload { .. } => "upload",
        }
    }
}
