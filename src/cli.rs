/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{builder::PossibleValue, Parser, Subcommand, ValueEnum};

use crate::{
    evaluate_outcome, generate_legal, move_to_text, moves_to_san, parse_move_list, perft,
    splitperft, Engine, Evaluator, Notation, OpeningBook, Position, SearchConfig, TTable,
    FEN_STARTPOS,
};

/// Developer tools for the tadpole chess core.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    /// The position to operate on.
    #[arg(short, long, global = true, default_value = FEN_STARTPOS)]
    pub fen: String,

    /// Moves to play from `fen` before running the command.
    ///
    /// Each move may be written in SAN, LAN, or coordinate notation.
    #[arg(short, long, global = true, num_args = 1.., value_delimiter = ' ')]
    pub moves: Vec<String>,

    /// Stop at the first bad move in `moves` instead of failing.
    #[arg(long, global = true, default_value = "false")]
    pub ignore_errors: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// A command to run on the position.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Performs a perft on the position at the supplied depth, printing total node count.
    Perft { depth: usize },

    /// Performs a split perft on the position at the supplied depth.
    #[command(alias = "sperft")]
    Splitperft { depth: usize },

    /// Search for the best move.
    #[command(alias = "go")]
    Search {
        /// Maximum depth, in plies.
        #[arg(short, long)]
        depth: Option<u8>,

        /// Maximum number of nodes.
        #[arg(short, long)]
        nodes: Option<u64>,

        /// Time to search, in milliseconds.
        #[arg(short = 't', long)]
        movetime: Option<u64>,

        /// Size of the transposition table, in megabytes.
        #[arg(long, default_value_t = TTable::DEFAULT_SIZE)]
        hash: usize,

        /// Disable the transposition table.
        #[arg(long, default_value = "false")]
        no_ttable: bool,

        /// Probability of cutting a quiescence search short, in `[0, 1]`.
        #[arg(long, default_value_t = 0.0)]
        skip_chance: f64,

        /// Seed of the random number generator behind `skip-chance`.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Path to an opening book to probe before searching.
        #[arg(short, long)]
        book: Option<PathBuf>,
    },

    /// Print whether the game is over, and how.
    Status,

    /// Shows all legal moves in the position.
    Moves {
        /// Notation to print moves in.
        #[arg(short, long, default_value = "san")]
        notation: Notation,

        /// If set, moves will be sorted in alphabetical order.
        #[arg(short, long, default_value = "false")]
        sort: bool,
    },

    /// Print an evaluation of the position.
    Eval {
        /// If set, the value of every piece will be printed as well.
        #[arg(short, long, default_value = "false")]
        pretty: bool,
    },

    /// Print the FEN of the position, after any moves have been applied.
    Fen,
}

impl Cli {
    /// Builds the position described by `fen` and `moves`.
    pub fn position(&self) -> Result<Position> {
        let mut position: Position = self.fen.parse()?;

        let moves = self.moves.iter().map(String::as_str).collect::<Vec<_>>();
        for mv in parse_move_list(&position, &moves, None, self.ignore_errors)? {
            position.make_move(mv);
        }

        Ok(position)
    }

    /// Executes the command, printing its results to stdout.
    pub fn run(self) -> Result<()> {
        let mut position = self.position()?;

        match self.command {
            Command::Perft { depth } => println!("{}", perft(&mut position, depth)),

            Command::Splitperft { depth } => {
                let mut total = 0;
                for (mv, nodes) in splitperft(&mut position, depth) {
                    println!("{mv}\t{nodes}");
                    total += nodes;
                }
                println!("\n{total}");
            }

            Command::Search {
                depth,
                nodes,
                movetime,
                hash,
                no_ttable,
                skip_chance,
                seed,
                book,
            } => {
                let mut config = depth.map(SearchConfig::with_depth).unwrap_or_default();
                if let Some(nodes) = nodes {
                    config.max_nodes = nodes;
                }
                if let Some(ms) = movetime {
                    config.soft_timeout = Duration::from_millis(ms);
                    config.hard_timeout = Duration::from_millis(ms);
                }
                config.use_ttable = !no_ttable;
                config.quiescence_skip_chance = skip_chance;
                config.seed = seed;

                let mut engine = Engine::new(hash);
                if let Some(path) = book {
                    engine.set_book(OpeningBook::open(path)?);
                }

                let res = engine.search(&position, config)?;
                let pv = moves_to_san(&position, res.pv.moves()).join(" ");
                println!(
                    "depth {} score {} nodes {} pv {pv}",
                    res.depth, res.score, res.nodes
                );

                match res.bestmove {
                    Some(mv) => println!("bestmove {mv}"),
                    None => println!("bestmove (none)"),
                }
            }

            Command::Status => println!("{}", evaluate_outcome(&mut position)),

            Command::Moves { notation, sort } => {
                let moves = generate_legal(&mut position);
                let mut texts = moves
                    .into_iter()
                    .map(|mv| move_to_text(&mut position, mv, notation))
                    .collect::<Vec<_>>();

                if sort {
                    texts.sort();
                }

                println!("{}", texts.join(" "));
            }

            Command::Eval { pretty } => {
                let evaluator = Evaluator::new(&position);
                if pretty {
                    print!("{evaluator}\n\nScore: ");
                }
                println!("{}", evaluator.eval());
            }

            Command::Fen => println!("{}", position.to_fen()),
        }

        Ok(())
    }
}

impl ValueEnum for Notation {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Notation::San,
            Notation::Lan,
            Notation::Coordinate,
            Notation::Figurine,
        ]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        // Some notations have additional aliases
        let value = match self {
            Notation::San => PossibleValue::new("san"),
            Notation::Lan => PossibleValue::new("lan"),
            Notation::Coordinate => PossibleValue::new("coordinate").aliases(["uci", "coord"]),
            Notation::Figurine => PossibleValue::new("figurine").alias("fan"),
        };

        Some(value)
    }
}
