use anyhow::Result;
use clap::Parser;
use dumpstate::CommandTable;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = "Dump every memory mapping of a process, one file per mapping.")]
struct Args {
    #[arg(short, long, help = "PID of target process.", required_unless_present = "list")]
    pid: Option<i32>,

    #[arg(short, long, help = "List the available commands and exit.")]
    list: bool,

    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        default_value = "dumpstate",
        help = "Command to run against the process, e.g. `dumpstate /tmp/out`."
    )]
    command: Vec<String>,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();
    let table = CommandTable::with_defaults();

    if args.list {
        for name in table.names() {
            if let Some(command) = table.get(name) {
                println!("{}", command.usage());
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(pid) = args.pid else {
        return Ok(ExitCode::FAILURE);
    };

    // attached lazily by the command, after its arguments check out
    let mut process = Process::new(pid);
    let result = table.dispatch(&mut process, &args.command.join(" "));
    process.detach()?;

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(target_os = "linux")]
use linux::Process;
