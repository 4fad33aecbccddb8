mod cli;
mod rlpl;
mod rppl;

use std::{path::PathBuf, rc::Rc};

use clap::Parser;
use cli::{print_checked, print_checking, print_ran, print_running};
use sprig_core::{
    check_source, run_from_stream,
    utils::prelude::{Error, Warning, WarningEmitterIO},
};

#[derive(Parser)]
enum Command {
    /// Parse, check and evaluate a program
    Run {
        /// Path of source file
        path: PathBuf,
        /// Do not print the final value
        #[arg(short, long, default_value_t = false)]
        no_value: bool,
    },
    /// Parse a program and run the structural inference pass only
    Check {
        /// Path of source file
        path: PathBuf,
        /// Print the ast instead of the parsed source code
        #[arg(long, default_value_t = false)]
        print_ast: bool,
    },
    /// Runs Read Lex Print Loop
    Rlpl,
    /// Runs Read Parse Print Loop
    Rppl,
}

fn main() {
    match Command::parse() {
        Command::Run { path, no_value } => {
            let warning_emitter = Rc::new(ConsoleWarningEmitter);

            let buf_writer = cli::stderr_buffer_writer();
            let mut buf = buf_writer.buffer();

            print_running(&path.to_string_lossy());
            let start = std::time::Instant::now();

            match run_from_stream(path, warning_emitter) {
                Ok(evaluated) => {
                    print!("{}", evaluated.output);

                    if !no_value {
                        println!("{}", evaluated.value);
                    }
                },
                Err(err) => {
                    err.pretty(&mut buf);
                    buf_writer
                        .print(&buf)
                        .expect("Writing error to stderr");
                }
            }

            print_ran(std::time::Instant::now() - start);
        },
        Command::Check { path, print_ast } => {
            let warning_emitter = Rc::new(ConsoleWarningEmitter);

            let buf_writer = cli::stderr_buffer_writer();
            let mut buf = buf_writer.buffer();

            print_checking(&path.to_string_lossy());
            let start = std::time::Instant::now();

            let src = match std::fs::read_to_string(&path) {
                Ok(src) => src,
                Err(err) => {
                    Error::StdIo { err: err.kind() }.pretty(&mut buf);
                    buf_writer
                        .print(&buf)
                        .expect("Writing error to stderr");
                    return;
                }
            };

            match check_source(path, &src, warning_emitter) {
                Ok(module) => {
                    if print_ast {
                        println!("{:#?}", module.program);
                    } else {
                        println!("{}", module.program);
                    }
                },
                Err(err) => {
                    err.pretty(&mut buf);
                    buf_writer
                        .print(&buf)
                        .expect("Writing error to stderr");
                }
            }

            print_checked(std::time::Instant::now() - start);
        },
        Command::Rlpl => {
            install_interrupt_handler();
            let _ = rlpl::start();
        },
        Command::Rppl => {
            install_interrupt_handler();
            let _ = rppl::start();
        }
    };
}

fn install_interrupt_handler() {
    ctrlc::set_handler(|| {
        println!();
        std::process::exit(0);
    })
    .expect("Setting Ctrl-C handler");
}

#[derive(Debug, Clone, Copy)]
pub struct ConsoleWarningEmitter;

impl WarningEmitterIO for ConsoleWarningEmitter {
    fn emit_warning(&self, warning: Warning) {
        let buffer_writer = cli::stderr_buffer_writer();
        let mut buffer = buffer_writer.buffer();
        warning.pretty(&mut buffer);
        buffer_writer
            .print(&buffer)
            .expect("Writing warning to stderr");
    }
}
