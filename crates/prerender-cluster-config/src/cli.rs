//! Command-line configuration source.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::validate::{BASE_PORT, ITERATIONS, PORT, WORKERS};
use crate::{
    parse_boolean_switch, ConfigError, IntegerRule, PartialConfig, Plugin, ValidationError,
};

/// Command-line arguments for the prerender cluster.
///
/// Numeric values are captured as raw strings and checked by the validator,
/// so a bad value reports the flag, the raw input, and how to fix it.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "prerender-cluster", version, about, long_about = None)]
pub struct CliArgs {
    /// JSON (or TOML) configuration file
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Worker processes, 0 to use every CPU [default: 1]
    #[arg(short = 'w', long, value_name = "NUMBER", allow_hyphen_values = true)]
    pub workers: Option<String>,

    /// Requests served before the headless engine restarts [default: 200]
    #[arg(short = 'i', long, value_name = "NUMBER", allow_hyphen_values = true)]
    pub iterations: Option<String>,

    /// Port this server listens on [default: 3030]
    #[arg(short = 'p', long, value_name = "NUMBER", allow_hyphen_values = true)]
    pub port: Option<String>,

    /// Starting port of the headless engine cluster [default: 12400]
    #[arg(
        short = 'b',
        long = "phantomBasePort",
        value_name = "NUMBER",
        allow_hyphen_values = true
    )]
    pub phantom_base_port: Option<String>,

    /// Remove <script> blocks after the page is rendered [default: true]
    #[arg(long = "removeScriptTags", visible_alias = "ns", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub remove_script_tags: Option<String>,

    /// Load the httpHeaders middleware [default: true]
    #[arg(long = "httpHeaders", visible_alias = "hh", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub http_headers: Option<String>,

    /// Load the basicAuth middleware [default: false]
    #[arg(long = "basicAuth", visible_alias = "ba", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub basic_auth: Option<String>,

    /// Load the blacklist middleware [default: false]
    #[arg(long, visible_alias = "bl", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub blacklist: Option<String>,

    /// Load the whitelist middleware [default: false]
    #[arg(long, visible_alias = "wl", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub whitelist: Option<String>,

    /// Load the request logger middleware [default: false]
    #[arg(long, visible_alias = "lg", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub logger: Option<String>,

    /// Load the in-memory HTML cache middleware [default: false]
    #[arg(long = "inMemoryHtmlCache", visible_alias = "mc", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub in_memory_html_cache: Option<String>,

    /// Load the S3 HTML cache middleware [default: false]
    #[arg(long = "s3HtmlCache", visible_alias = "s3", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub s3_html_cache: Option<String>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

struct NumericFlag {
    flag: &'static str,
    rule: IntegerRule,
    remediation: &'static str,
}

const WORKERS_FLAG: NumericFlag = NumericFlag {
    flag: "--workers",
    rule: WORKERS,
    remediation: "workers must be 0 (all CPUs) or a number between 1 and 128",
};

const ITERATIONS_FLAG: NumericFlag = NumericFlag {
    flag: "--iterations",
    rule: ITERATIONS,
    remediation: "iterations must be a number between 1 and 500",
};

const PORT_FLAG: NumericFlag = NumericFlag {
    flag: "--port",
    rule: PORT,
    remediation: "port must be a number between 3000 and 64000",
};

const BASE_PORT_FLAG: NumericFlag = NumericFlag {
    flag: "--phantomBasePort",
    rule: BASE_PORT,
    remediation: "phantomBasePort must be a number between 3001 and 64000",
};

impl NumericFlag {
    fn parse<T: TryFrom<i64>>(&self, raw: &str) -> Result<T, ValidationError> {
        let attribute = |mut e: ValidationError| {
            e.supplied_value = raw.to_string();
            e.with_field(self.flag).with_remediation(self.remediation)
        };

        let value = self.rule.validate(raw).map_err(attribute)?;
        T::try_from(value).map_err(|_| {
            attribute(ValidationError::out_of_range(raw, self.rule.min, self.rule.max))
        })
    }
}

/// The highest-precedence configuration source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliSource {
    /// Path given with `--config`, if any.
    pub config_path: Option<PathBuf>,
    /// Whether `--print-config` was given.
    pub print_config: bool,
    /// Values set on the command line.
    pub partial: PartialConfig,
}

impl CliSource {
    /// Parse an argument list; the first item is the program name.
    ///
    /// # Example
    ///
    /// ```
    /// use prerender_cluster_config::CliSource;
    ///
    /// let cli = CliSource::parse_from(["prerender-cluster", "--port", "8080", "--logger"]).unwrap();
    /// assert_eq!(cli.partial.service_options.listen_port, Some(8080));
    /// assert_eq!(cli.partial.plugin_toggles["logger"].enabled, Some(true));
    /// ```
    pub fn parse_from<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = CliArgs::try_parse_from(args)?;
        Ok(Self::from_args(args)?)
    }

    /// Parse the current process arguments.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse_from(std::env::args_os())
    }

    /// Validate already-parsed arguments.
    pub fn from_args(args: CliArgs) -> Result<Self, ValidationError> {
        let mut partial = PartialConfig::default();
        let options = &mut partial.service_options;

        if let Some(raw) = args.workers.as_deref() {
            options.worker_count = Some(WORKERS_FLAG.parse(raw)?);
        }
        if let Some(raw) = args.iterations.as_deref() {
            options.restart_after_n_requests = Some(ITERATIONS_FLAG.parse(raw)?);
        }
        if let Some(raw) = args.port.as_deref() {
            options.listen_port = Some(PORT_FLAG.parse(raw)?);
        }
        if let Some(raw) = args.phantom_base_port.as_deref() {
            options.base_port = Some(BASE_PORT_FLAG.parse(raw)?);
        }

        let switches = [
            (args.remove_script_tags.as_deref(), Plugin::RemoveScriptTags),
            (args.http_headers.as_deref(), Plugin::HttpHeaders),
            (args.basic_auth.as_deref(), Plugin::BasicAuth),
            (args.blacklist.as_deref(), Plugin::Blacklist),
            (args.whitelist.as_deref(), Plugin::Whitelist),
            (args.logger.as_deref(), Plugin::Logger),
            (args.in_memory_html_cache.as_deref(), Plugin::InMemoryHtmlCache),
            (args.s3_html_cache.as_deref(), Plugin::S3HtmlCache),
        ];
        for (raw, plugin) in switches {
            if let Some(raw) = raw {
                partial.set_plugin_enabled(plugin.name(), parse_boolean_switch(Some(raw)));
            }
        }

        Ok(Self {
            config_path: args.config,
            print_config: args.print_config,
            partial,
        })
    }
}
