mod cli;

use std::fmt::Display;
use std::process::ExitCode;

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use cli::Cli;
use llfront::generator::GenResult;
use llfront::grammar::Grammar;
use llfront::sets::{compute_first, compute_follow, display_sets};
use llfront::table::ParseTable;
use llfront::{generator, loader, parser, semantic, table, token};

fn report<E: Display>(errors: impl IntoIterator<Item = E>) -> ExitCode {
    for error in errors {
        eprintln!("{}", error);
    }
    ExitCode::FAILURE
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn generate_sentences(cli: &Cli, grammar: &Grammar, amount: u32) -> GenResult<()> {
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for _ in 0..amount {
        let tokens = generator::generate(grammar, grammar.start_symbol(), &mut rng, cli.max_depth)?;
        println!("{}", tokens.iter().map(|t| t.lexeme.as_str()).join(" "));
    }
    Ok(())
}

fn parse_tokens(cli: &Cli, grammar: &Grammar, table: &ParseTable) -> ExitCode {
    let Some(path) = &cli.tokens else {
        return ExitCode::SUCCESS;
    };

    let tokens = match token::read_tokens(path) {
        Ok(tokens) => tokens,
        Err(errors) => return report(errors),
    };
    debug!("Read {} tokens from {}", tokens.len(), path.display());

    let tree = match parser::parse(&tokens, table, grammar) {
        Ok(tree) => tree,
        Err(error) => return report([error]),
    };
    info!("Parsed {}", path.display());

    if cli.tree {
        print!("{}", tree);
    }

    if cli.check {
        match semantic::analyze(&tree) {
            Ok(symbols) => print!("{}", symbols),
            Err(error) => return report([error]),
        }
    }

    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let grammar = match loader::parse_file(&cli.file, cli.start.as_deref()) {
        Ok(grammar) => grammar,
        Err(errors) => return report(errors),
    };

    for name in generator::unproductive(&grammar) {
        warn!("`{}` cannot derive a finite sentence", name);
    }

    let first = compute_first(&grammar);
    let follow = compute_follow(&grammar, &first, grammar.start_symbol());
    if cli.sets {
        println!("FIRST");
        print!("{}", display_sets(&grammar, &first));
        println!("FOLLOW");
        print!("{}", display_sets(&grammar, &follow));
    }

    let table = match table::build(&grammar, &first, &follow) {
        Ok(table) => table,
        Err(conflict) => return report([conflict]),
    };
    if cli.table {
        print!("{}", table);
    }

    if let Some(amount) = cli.amount {
        if let Err(error) = generate_sentences(&cli, &grammar, amount) {
            return report([error]);
        }
    }

    parse_tokens(&cli, &grammar, &table)
}
