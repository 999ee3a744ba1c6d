use clap::{Parser, Subcommand, ValueEnum};

use crate::shuttle::{Chamber, CmpResult, TextId, VoteOutcome};

pub mod commands;

#[derive(Parser)]
#[command(name = "navette")]
#[command(about = "Track legislative texts through the parliamentary shuttle")]
#[command(long_about = "Navette records where a bill sits between the Assemblée nationale and the Sénat, \
                       validates every procedural move against the shuttle graph and keeps an append-only \
                       history of each text. Start with 'navette create' to deposit a text.")]
pub struct Cli {
    /// Override the directory used by the file storage backend
    #[arg(long, global = true, help = "Directory holding one JSON file per text")]
    pub storage_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deposit a new text in its origin chamber
    Create {
        #[arg(long, value_enum, help = "Chamber where the text is deposited")]
        origin: ChamberArg,
        #[arg(long)]
        title: String,
        /// Official reference, e.g. PL-2025-001
        #[arg(long)]
        reference: String,
        /// Accelerated procedure
        #[arg(long)]
        urgent: bool,
    },
    /// Move a text to the next step inside its chamber
    Advance { id: TextId },
    /// Record the outcome of a chamber vote
    Vote {
        id: TextId,
        #[arg(long, value_enum)]
        chamber: ChamberArg,
        #[arg(long, value_enum)]
        outcome: OutcomeArg,
    },
    /// Send an adopted text to the other chamber
    Transmit { id: TextId },
    /// Joint committee (CMP) operations
    Cmp {
        #[command(subcommand)]
        action: CmpAction,
    },
    /// Promulgate a definitively adopted text
    Promulgate { id: TextId },
    /// Show where a text stands
    Show {
        id: TextId,
        #[arg(long, help = "Print the projection as JSON")]
        json: bool,
    },
    /// Print the transition history of a text
    History {
        id: TextId,
        #[arg(long, help = "Print the history as JSON")]
        json: bool,
    },
    /// List every tracked text
    List {
        #[arg(long, help = "Print the projections as JSON")]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum CmpAction {
    /// Convene a joint committee after diverging readings
    Convene { id: TextId },
    /// Open committee deliberations
    Open { id: TextId },
    /// Record the committee's conclusion
    Resolve {
        id: TextId,
        #[arg(long, value_enum)]
        result: ResultArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ChamberArg {
    Assembly,
    Senate,
}

impl From<ChamberArg> for Chamber {
    fn from(arg: ChamberArg) -> Self {
        match arg {
            ChamberArg::Assembly => Chamber::Assembly,
            ChamberArg::Senate => Chamber::Senate,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutcomeArg {
    Adopted,
    Amended,
    Rejected,
}

impl From<OutcomeArg> for VoteOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Adopted => VoteOutcome::Adopted,
            OutcomeArg::Amended => VoteOutcome::Amended,
            OutcomeArg::Rejected => VoteOutcome::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ResultArg {
    Agreement,
    Failure,
}

impl From<ResultArg> for CmpResult {
    fn from(arg: ResultArg) -> Self {
        match arg {
            ResultArg::Agreement => CmpResult::Agreement,
            ResultArg::Failure => CmpResult::Failure,
        }
    }
}
