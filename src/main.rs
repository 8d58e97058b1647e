use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[clap(name = "snek", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: SnekCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnekCommand {
    /// Dump the token stream of a source file.
    Tokenize {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: TokenFormat,
    },
    /// Execute a source file.
    Run { path: PathBuf },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TokenFormat {
    Debug,
    Basic,
    Pretty,
}

fn main() -> ExitCode {
    snek_main().expect("Encountered an error!")
}

fn snek_main() -> Result<ExitCode> {
    color_eyre::install().expect("Can't fail at first call!");
    let args = CLArgs::parse();
    match args.routine {
        SnekCommand::Tokenize { path, format } => {
            eprintln!("Tokenizing {:?}...", path);
            let src = read_to_string(&path)?;
            if !tokenize(&src, &path, &format)? {
                return Ok(ExitCode::from(65));
            }
        }
        SnekCommand::Run { path } => {
            let src = read_to_string(&path)?;
            if !run(&src, &path)? {
                return Ok(ExitCode::from(70));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn tokenize(src: &str, path: &Path, format: &TokenFormat) -> Result<bool> {
    use snek::lexer::formatter::{
        BasicFormatter, DebugFormatter, PrettyFormatter, TokenFormatter,
    };
    use snek::lexer::{Lexer, Token};

    let formatter: Box<dyn TokenFormatter + '_> = match format {
        TokenFormat::Debug => Box::new(DebugFormatter),
        TokenFormat::Basic => Box::new(BasicFormatter),
        TokenFormat::Pretty => Box::new(PrettyFormatter::new(src, path)),
    };
    let mut scanner = match Lexer::new(src.as_bytes()) {
        Ok(scanner) => scanner,
        Err(error) => {
            eprintln!("{}", formatter.format_lexer_error(&error));
            return Ok(false);
        }
    };
    println!("{}", formatter.format(scanner.current_token()));
    if matches!(scanner.current_token(), Token::Eof) {
        return Ok(true);
    }
    loop {
        match scanner.next_token() {
            Ok(token) => {
                println!("{}", formatter.format(&token));
                if matches!(token, Token::Eof) {
                    return Ok(true);
                }
            }
            Err(error) => {
                eprintln!("{}", formatter.format_lexer_error(&error));
                return Ok(false);
            }
        }
    }
}

fn run(src: &str, path: &Path) -> Result<bool> {
    use snek::interpreter::Interpreter;
    use snek::lexer::formatter::{PrettyFormatter, TokenFormatter};
    use snek::parser::{Parser, ParserErrorKind};
    use snek::runtime::SimpleContext;

    let program = match Parser::new(src.as_bytes()).and_then(|parser| parser.parse()) {
        Ok(program) => program,
        Err(error) => {
            if let ParserErrorKind::Lexer(lexer_error) = &error.kind {
                let formatter = PrettyFormatter::new(src, path);
                eprintln!("{}", formatter.format_lexer_error(lexer_error));
            } else {
                eprintln!("{error}");
            }
            return Ok(false);
        }
    };

    let interpreter = Interpreter::new(SimpleContext::new(std::io::stdout().lock()));
    match interpreter.run(&program) {
        Ok(_) => Ok(true),
        Err(error) => {
            eprintln!("[{}] {error}", error.code());
            Ok(false)
        }
    }
}
