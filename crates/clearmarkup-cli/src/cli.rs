use std::path::PathBuf;

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use clearmarkup_db::{ConditionValue, Direction, Value};

use crate::utils::{parse_assignment, parse_condition, parse_order, parse_relation, parse_transform};

#[derive(Parser)]
#[command(
    name = "clearmarkup",
    about = "Query clearmarkup databases from the command line",
    version,
    arg_required_else_help = true
)]
pub struct Args {
    /// Unimportant logs (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results and logs as JSON
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overrides the configured one
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by the reading commands.
#[derive(ClapArgs, Clone)]
pub struct QueryArgs {
    /// Condition as `key=value`, value parsed as JSON when possible
    #[arg(short = 'w', long = "where", value_parser = parse_condition)]
    pub filters: Vec<(String, ConditionValue)>,

    /// Sort column, optionally suffixed with `:desc`
    #[arg(short, long, value_parser = parse_order)]
    pub order: Vec<(String, Direction)>,

    #[arg(short, long)]
    pub limit: Option<u64>,

    #[arg(long, requires = "limit")]
    pub offset: Option<u64>,

    /// Restrict `id` to the values of a column in another table, as `table:column`
    #[arg(long, value_parser = parse_relation)]
    pub rel: Option<(String, String)>,

    /// Condition on the related table, as `key=value`
    #[arg(long, value_parser = parse_condition, requires = "rel")]
    pub rel_where: Vec<(String, ConditionValue)>,
}

/// Column selection for `select` and `get`.
#[derive(ClapArgs, Clone)]
pub struct ColumnArgs {
    /// Columns to fetch (comma separated), all when omitted
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Transform for a column, as `column=trim|escape`
    #[arg(short, long, value_parser = parse_transform)]
    pub transform: Vec<(String, String)>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all matching rows
    #[clap(name = "select", visible_alias = "s")]
    Select {
        table: String,
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        columns: ColumnArgs,
    },

    /// Fetch the first matching row
    #[clap(name = "get", visible_alias = "g")]
    Get {
        table: String,
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        columns: ColumnArgs,
    },

    /// Count matching rows
    #[clap(name = "count")]
    Count {
        table: String,
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Check whether any row matches
    #[clap(name = "has")]
    Has {
        table: String,
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Insert a row
    #[clap(name = "insert", visible_alias = "i")]
    Insert {
        table: String,
        /// Column value as `column=value`
        #[arg(short = 's', long = "set", value_parser = parse_assignment)]
        values: Vec<(String, Value)>,
    },

    /// Update matching rows
    #[clap(name = "update", visible_alias = "u")]
    Update {
        table: String,
        /// Column value as `column=value`; `column[+]=1` increments
        #[arg(short = 's', long = "set", value_parser = parse_assignment, required = true)]
        values: Vec<(String, Value)>,
        #[arg(short = 'w', long = "where", value_parser = parse_condition)]
        filters: Vec<(String, ConditionValue)>,
    },

    /// Delete matching rows
    #[clap(name = "delete", visible_alias = "d")]
    Delete {
        table: String,
        #[arg(short = 'w', long = "where", value_parser = parse_condition)]
        filters: Vec<(String, ConditionValue)>,
    },
}
