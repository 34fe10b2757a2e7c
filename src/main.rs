use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use kplc::DisplayObject;
use kplc::Lexer;
use kplc::SourceIoError;
use kplc::lex::TokenKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Front end for the KPL teaching language")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every token with its position.
    Tokenize { filename: PathBuf },
    /// Parse a program and print its resolved symbol table.
    Parse {
        filename: PathBuf,
        /// Only report errors.
        #[arg(short, long)]
        quiet: bool,
    },
}

/// 74 when the source could not be read, 65 for anything wrong with its contents.
fn exit_code(e: &miette::Error) -> i32 {
    if e.downcast_ref::<SourceIoError>().is_some() {
        74
    } else {
        65
    }
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Tokenize { filename } => {
            let file_contents = match kplc::read_source(&filename) {
                Ok(contents) => contents,
                Err(e) => {
                    eprintln!("{e:?}");
                    std::process::exit(exit_code(&e));
                }
            };

            let mut lexer = Lexer::new(filename.to_str(), &file_contents);
            loop {
                let token = match lexer.next_token() {
                    Ok(token) => token,
                    Err(e) => {
                        eprintln!("{e:?}");
                        std::process::exit(65);
                    }
                };
                println!("{token}");
                if token.kind == TokenKind::Eof {
                    break;
                }
            }
        }
        Commands::Parse { filename, quiet } => {
            let symtab = match kplc::compile(&filename) {
                Ok(symtab) => symtab,
                Err(e) => {
                    eprintln!("{e:?}");
                    std::process::exit(exit_code(&e));
                }
            };

            if !quiet {
                if let Some(program) = symtab.program() {
                    println!("{}", DisplayObject(&symtab, program));
                }
            }
            symtab.clean();
        }
    }
    Ok(())
}
