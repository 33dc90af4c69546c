//! CLI integration tests against on-disk fixtures.
//!
//! Tests cover:
//! - Config loading and validation with real INI files
//! - Each subcommand end to end with the CSV provider
//! - Exit statuses for config, portfolio and data failures

mod common;

use clap::Parser;
use komorebi::cli::{self, Cli};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let prices = dir.path().join("prices");
        fs::create_dir_all(&prices).unwrap();
        fs::write(
            prices.join("GD.csv"),
            "date,close\n2024-01-01,250\n2024-01-02,255\n2024-01-03,260\n2024-01-04,265\n2024-01-05,275\n",
        )
        .unwrap();
        fs::write(
            prices.join("VIE.PA.csv"),
            "date,close\n2024-01-01,30\n2024-01-02,30\n2024-01-03,\n2024-01-04,31\n2024-01-05,33\n",
        )
        .unwrap();
        fs::write(
            prices.join("^FCHI.csv"),
            "date,close\n2024-01-01,7000\n2024-01-05,7140\n",
        )
        .unwrap();
        fs::write(
            prices.join("profiles.csv"),
            "ticker,long_name,sector,industry,country,currency,pe_ratio,eps,market_cap,dividend_yield\n\
             GD,General Dynamics,Industrials,Aerospace & Defense,United States,USD,21.5,12.0,7.1e10,2.1\n\
             VIE.PA,Veolia,Utilities,Utilities,France,EUR,18.0,1.5,2.2e10,4.0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("portfolio.csv"),
            "name,ticker,currency,dividend_yield\nGeneral Dynamics,GD,$,\nVeolia,VIE.PA,€,4.5\n",
        )
        .unwrap();
        Fixture { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_config(&self, extra: &str) -> PathBuf {
        let content = format!(
            "[portfolio]\nfile = {}\nstart_date = 2024-01-01\nend_date = 2024-01-05\n\
             [references]\nindices = CAC 40:^FCHI\n\
             [data]\nprovider = csv\ncsv_dir = {}\n\
             [report]\noutput_dir = {}\n{extra}",
            self.path("portfolio.csv").display(),
            self.path("prices").display(),
            self.path("out").display(),
        );
        let path = self.path("komorebi.ini");
        fs::write(&path, content).unwrap();
        path
    }
}

/// Exit status the binary would report; 0 on success.
fn run(args: &[&str]) -> u8 {
    let mut argv = vec!["komorebi"];
    argv.extend_from_slice(args);
    match cli::execute(Cli::try_parse_from(argv).unwrap()) {
        Ok(()) => 0,
        Err(e) => e.exit_status(),
    }
}

fn config_arg(path: &Path) -> String {
    path.display().to_string()
}

mod config_loading {
    use super::*;

    #[test]
    fn valid_config_loads() {
        let fx = Fixture::new();
        let config = fx.write_config("");
        let adapter = cli::load_config(&config).unwrap();
        let analysis = cli::build_analysis_config(&adapter).unwrap();
        assert_eq!(analysis.references.len(), 1);
        assert_eq!(analysis.csv_dir, fx.path("prices"));
    }

    #[test]
    fn invalid_ttl_rejected() {
        let fx = Fixture::new();
        let config = fx.write_config("[cache]\nhistory_ttl_secs = 0\n");
        let err = cli::load_config(&config).err().unwrap();
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn validate_command() {
        let fx = Fixture::new();
        let config = fx.write_config("");
        assert_eq!(run(&["validate", "-c", &config_arg(&config)]), 0);
    }
}

mod commands {
    use super::*;

    #[test]
    fn performance_writes_report() {
        let fx = Fixture::new();
        let config = fx.write_config("");
        let code = run(&["performance", "-c", &config_arg(&config)]);
        assert_eq!(code, 0);

        let content = fs::read_to_string(fx.path("out/performance.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "date,Portfolio,CAC 40");
        assert_eq!(lines.len(), 6);
        // GD 110, VIE.PA 110, CAC 40 102
        assert_eq!(lines[5], "2024-01-05,110.0000,102.0000");
        // gap on the 3rd is forward-filled; CAC 40 has no print until the 5th
        assert_eq!(lines[3], "2024-01-03,102.0000,100.0000");
    }

    #[test]
    fn simulate_with_capital_override() {
        let fx = Fixture::new();
        let config = fx.write_config("");
        let output = fx.path("sim.csv");
        let code = run(&[
            "simulate",
            "-c",
            &config_arg(&config),
            "--capital",
            "1000",
            "-o",
            &config_arg(&output),
        ]);
        assert_eq!(code, 0);

        let content = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "date,Portfolio Total,GD,VIE.PA");
        assert_eq!(lines[1], "2024-01-01,1000.0000,500.0000,500.0000");
        assert_eq!(lines[5], "2024-01-05,1100.0000,550.0000,550.0000");
    }

    #[test]
    fn allocation_by_country() {
        let fx = Fixture::new();
        let config = fx.write_config("");
        let code = run(&["allocation", "-c", &config_arg(&config), "--by", "country"]);
        assert_eq!(code, 0);

        let content = fs::read_to_string(fx.path("out/country.csv")).unwrap();
        assert!(content.starts_with("label,weight,percent\n"));
        assert!(content.contains("France,0.500000,50.00"));
        assert!(content.contains("United States,0.500000,50.00"));
    }

    #[test]
    fn quotes_and_stats_succeed() {
        let fx = Fixture::new();
        let config = fx.write_config("");
        assert_eq!(run(&["quotes", "-c", &config_arg(&config)]), 0);
        assert_eq!(run(&["quotes", "-c", &config_arg(&config), "--tickers", "GD,^FCHI"]), 0);
        assert_eq!(run(&["stats", "-c", &config_arg(&config), "--top", "1"]), 0);
    }
}

mod exit_statuses {
    use super::*;

    #[test]
    fn missing_config_file() {
        assert_eq!(run(&["validate", "-c", "/nonexistent/komorebi.ini"]), 2);
    }

    #[test]
    fn bad_portfolio_file() {
        let fx = Fixture::new();
        fs::write(fx.path("portfolio.csv"), "name,ticker\nA,GD\nB,GD\n").unwrap();
        let config = fx.write_config("");
        assert_eq!(run(&["validate", "-c", &config_arg(&config)]), 4);
    }

    #[test]
    fn no_usable_data() {
        let fx = Fixture::new();
        fs::write(fx.path("portfolio.csv"), "name,ticker\nNobody,NOPE\n").unwrap();
        let config = fx.write_config("");
        assert_eq!(run(&["performance", "-c", &config_arg(&config)]), 5);
    }

    #[test]
    fn malformed_ttl_is_config_error() {
        let fx = Fixture::new();
        let config = fx.write_config("[cache]\nquote_ttl_secs = 30s\n");
        assert_eq!(run(&["validate", "-c", &config_arg(&config)]), 2);
    }

    #[test]
    fn malformed_ticker_list() {
        let fx = Fixture::new();
        let config = fx.write_config("");
        assert_eq!(run(&["quotes", "-c", &config_arg(&config), "--tickers", "GD,,SLB"]), 2);
    }
}
