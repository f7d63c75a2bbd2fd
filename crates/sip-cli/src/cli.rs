use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sip_pack::PackageFormat;
use sip_rules::Association;

#[derive(Parser)]
#[command(
    name = "sipforge",
    about = "Map filesystem trees onto archival submission packages",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan roots and print the disposition summary
    Scan(ScanArgs),
    /// Apply a mapping rule against a scan and print the planned packages
    Plan(PlanArgs),
    /// Scan, map, and export packages
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ScanArgs {
    /// Root directories to walk
    #[arg(required = true)]
    pub roots: Vec<PathBuf>,
    /// Gitignore-style pattern for entries to hide (repeatable)
    #[arg(long = "ignore")]
    pub ignore: Vec<String>,
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Root directories to walk and map
    #[arg(required = true)]
    pub roots: Vec<PathBuf>,
    #[arg(short, long, default_value = "per-top-level")]
    pub association: AssociationArg,
    /// Only include files matching this glob (repeatable)
    #[arg(long = "include")]
    pub include: Vec<String>,
    /// Exclude files matching this glob (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,
    #[arg(long = "ignore")]
    pub ignore: Vec<String>,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Configuration key of a metadata template to attach
    #[arg(long)]
    pub metadata: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub plan: PlanArgs,
    /// Package format to produce
    #[arg(short, long, default_value = "bagit")]
    pub format: FormatArg,
    /// Directory the packages are written into
    #[arg(short, long)]
    pub output: PathBuf,
    /// Write an inventory report.json next to the packages
    #[arg(long)]
    pub report: bool,
}

/// Association strategy as a CLI value.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum AssociationArg {
    Single,
    PerFile,
    PerTopLevel,
    PerSelection,
}

impl From<AssociationArg> for Association {
    fn from(arg: AssociationArg) -> Self {
        match arg {
            AssociationArg::Single => Association::Single,
            AssociationArg::PerFile => Association::PerFile,
            AssociationArg::PerTopLevel => Association::PerTopLevelStructure,
            AssociationArg::PerSelection => Association::PerSelection,
        }
    }
}

/// Package format as a CLI value.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FormatArg {
    Bagit,
    Eark1,
    Eark2,
    MetsHeader,
}

impl From<FormatArg> for PackageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Bagit => PackageFormat::BagIt,
            FormatArg::Eark1 => PackageFormat::EArkV1,
            FormatArg::Eark2 => PackageFormat::EArkV2,
            FormatArg::MetsHeader => PackageFormat::MetsHeader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scan() {
        let cli = Cli::try_parse_from(["sipforge", "scan", "/data"]).unwrap();
        if let Command::Scan(args) = cli.command {
            assert_eq!(args.roots, vec![PathBuf::from("/data")]);
            assert!(args.ignore.is_empty());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_scan_requires_roots() {
        assert!(Cli::try_parse_from(["sipforge", "scan"]).is_err());
    }

    #[test]
    fn parse_scan_with_ignores() {
        let cli =
            Cli::try_parse_from(["sipforge", "scan", "/data", "--ignore", "*.tmp", "--ignore", "*.bak"])
                .unwrap();
        if let Command::Scan(args) = cli.command {
            assert_eq!(args.ignore, vec!["*.tmp", "*.bak"]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_plan_association() {
        let cli = Cli::try_parse_from([
            "sipforge", "plan", "/data/docs", "/data/img", "-a", "per-file",
        ])
        .unwrap();
        if let Command::Plan(args) = cli.command {
            assert_eq!(args.roots.len(), 2);
            assert_eq!(Association::from(args.association), Association::PerFile);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_plan_defaults_to_per_top_level() {
        let cli = Cli::try_parse_from(["sipforge", "plan", "/data"]).unwrap();
        if let Command::Plan(args) = cli.command {
            assert_eq!(
                Association::from(args.association),
                Association::PerTopLevelStructure
            );
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_export() {
        let cli = Cli::try_parse_from([
            "sipforge", "export", "/data", "-f", "eark2", "-o", "/tmp/out", "--report",
        ])
        .unwrap();
        if let Command::Export(args) = cli.command {
            assert_eq!(PackageFormat::from(args.format), PackageFormat::EArkV2);
            assert_eq!(args.output, PathBuf::from("/tmp/out"));
            assert!(args.report);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_export_requires_output() {
        assert!(Cli::try_parse_from(["sipforge", "export", "/data"]).is_err());
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["sipforge", "scan", "/data", "--json"]).unwrap();
        assert!(cli.json);
    }
}
