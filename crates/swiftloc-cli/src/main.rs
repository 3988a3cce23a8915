use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use swiftloc_config::{load_config, SwiftLocConfig};
use swiftloc_core::TargetGroup;
use swiftloc_scan::{AcceptAll, KeywordDiacriticFilter};
use swiftloc_services::{
    collect_candidates, run_check, run_onboard, write_candidates_artifact, write_candidates_csv,
    OnboardOptions, ProjectLayout, ProjectOverrides,
};
use swiftloc_translate::{OpenAiProvider, DEFAULT_TIMEOUT_MS};
use tracing::{debug, error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "swiftloc", version, about = "Xcode project localization pipeline (Rust)")]
struct Cli {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Commands,
}

/// Layout flags shared by every subcommand; unset fields fall back to the
/// config file, then to discovery.
#[derive(clap::Args, Debug)]
struct LayoutArgs {
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
    #[arg(long)]
    app_dir: Option<String>,
    #[arg(long)]
    widget_dir: Option<String>,
    #[arg(long)]
    xcodeproj: Option<String>,
    /// Comma-separated target groups (app, widget)
    #[arg(long)]
    targets: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan sources and write the candidates inventory without translating
    Scan {
        #[command(flatten)]
        layout: LayoutArgs,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        source_lang: Option<String>,
        /// Also write candidates as CSV, one line per point of use
        #[arg(long)]
        out_csv: Option<PathBuf>,
    },

    /// Translate candidates and merge them into the project
    Onboard {
        #[command(flatten)]
        layout: LayoutArgs,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        source_lang: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        max_retries: Option<usize>,
        /// Stop after writing the candidates artifact
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Skip the post-merge unlocalized-literal check
        #[arg(long, default_value_t = false)]
        skip_checks: bool,
    },

    /// Report hard-coded source-language literals that bypassed the catalogs
    Check {
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

const USAGE_EXIT: i32 = 2;

fn usage_error(message: &str) -> ! {
    eprintln!("error: {message}");
    std::process::exit(USAGE_EXIT);
}

fn resolve_layout(args: &LayoutArgs, cfg: &SwiftLocConfig) -> Result<ProjectLayout> {
    let project = cfg.project.clone().unwrap_or_default();
    let overrides = ProjectOverrides {
        app_dir: args.app_dir.clone().or(project.app_dir),
        widget_dir: args.widget_dir.clone().or(project.widget_dir),
        xcodeproj: args.xcodeproj.clone().or(project.xcodeproj),
        info_plists: project.info_plists,
    };
    Ok(ProjectLayout::discover(&args.root, &overrides)?)
}

/// Resolve target groups: flag, then config, then every group the layout
/// actually has. Unknown group names are usage errors.
fn resolve_targets(args: &LayoutArgs, cfg: &SwiftLocConfig, layout: &ProjectLayout) -> Vec<TargetGroup> {
    let names: Option<Vec<String>> = args
        .targets
        .as_ref()
        .map(|s| s.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect())
        .or_else(|| cfg.include_targets.clone());

    match names {
        Some(names) => {
            let mut groups = Vec::new();
            for name in &names {
                match name.parse::<TargetGroup>() {
                    Ok(group) if !groups.contains(&group) => groups.push(group),
                    Ok(_) => {}
                    Err(e) => usage_error(&e.to_string()),
                }
            }
            if groups.is_empty() {
                usage_error("no target groups selected");
            }
            groups
        }
        None => [TargetGroup::App, TargetGroup::Widget]
            .into_iter()
            .filter(|g| layout.group_dir(*g).is_some())
            .collect(),
    }
}

fn source_filter(cfg: &SwiftLocConfig) -> KeywordDiacriticFilter {
    match &cfg.filter {
        Some(filter) if filter.keywords.is_some() || filter.diacritics.is_some() => {
            KeywordDiacriticFilter::new(
                filter.keywords.clone().unwrap_or_default(),
                filter.diacritics.as_deref().unwrap_or(""),
            )
        }
        _ => KeywordDiacriticFilter::spanish(),
    }
}

fn openai_provider(cfg: &SwiftLocConfig) -> Result<OpenAiProvider> {
    let Some(api_key) = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()) else {
        usage_error("OPENAI_API_KEY is not set");
    };
    let translate = cfg.translate.clone().unwrap_or_default();
    let provider = match translate.endpoint {
        Some(endpoint) => OpenAiProvider::with_endpoint(
            api_key,
            endpoint,
            translate.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        )?,
        None => OpenAiProvider::new(api_key)?,
    };
    Ok(provider)
}

trait Runnable {
    fn run(self, use_color: bool) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, use_color: bool) -> Result<()> {
        let cmd_name = format!("{:?}", self);
        info!("starting command: {}", cmd_name);
        let cfg = load_config()?;

        let result = match self {
            Commands::Scan { layout, lang, source_lang, out_csv } => {
                debug!("scan args: lang={:?} source_lang={:?} out_csv={:?}", lang, source_lang, out_csv);
                let resolved = resolve_layout(&layout, &cfg)?;
                let targets = resolve_targets(&layout, &cfg, &resolved);
                let layout = resolved;

                let source_lang = source_lang
                    .or(cfg.source_lang.clone())
                    .unwrap_or_else(|| "en".to_string());
                let lang = lang
                    .or(cfg.target_lang.clone())
                    .unwrap_or_else(|| "es".to_string());

                let outcome = collect_candidates(&layout, &targets, &AcceptAll)?;
                let include_names: Vec<String> = targets.iter().map(|g| g.to_string()).collect();
                let path = write_candidates_artifact(
                    &layout.artifact_dir(&lang),
                    &outcome.candidates,
                    &source_lang,
                    &lang,
                    &include_names,
                )?;
                if let Some(csv_path) = out_csv {
                    let file = std::fs::File::create(&csv_path)?;
                    write_candidates_csv(file, &outcome.candidates)?;
                    println!("CSV written to {}", csv_path.display());
                }
                print_ok(
                    use_color,
                    &format!(
                        "{} candidates written to {}",
                        outcome.candidates.len(),
                        path.display()
                    ),
                );
                Ok(())
            }

            Commands::Onboard {
                layout,
                lang,
                source_lang,
                model,
                batch_size,
                max_retries,
                dry_run,
                skip_checks,
            } => {
                debug!(
                    "onboard args: lang={:?} model={:?} batch_size={:?} max_retries={:?} dry_run={}",
                    lang, model, batch_size, max_retries, dry_run
                );
                let resolved = resolve_layout(&layout, &cfg)?;
                let targets = resolve_targets(&layout, &cfg, &resolved);

                let translate = cfg.translate.clone().unwrap_or_default();
                let check_targets = targets.clone();
                let opts = OnboardOptions {
                    source_language: source_lang
                        .or(cfg.source_lang.clone())
                        .unwrap_or_else(|| "en".to_string()),
                    language: lang
                        .or(cfg.target_lang.clone())
                        .unwrap_or_else(|| "es".to_string()),
                    model: model
                        .or(cfg.model.clone())
                        .unwrap_or_else(|| "gpt-4.1".to_string()),
                    batch_size: batch_size.or(cfg.batch_size).unwrap_or(30),
                    max_retries: max_retries.or(cfg.max_retries).unwrap_or(2),
                    cache_size: translate.cache_size.unwrap_or(1024),
                    include: targets,
                    dry_run,
                };

                let outcome = if dry_run {
                    // A dry run makes no requests, so no key is required.
                    struct NeverCalled;
                    impl swiftloc_translate::TranslationProvider for NeverCalled {
                        fn translate(
                            &self,
                            _req: &swiftloc_translate::BatchRequest<'_>,
                        ) -> std::result::Result<
                            std::collections::HashMap<String, String>,
                            swiftloc_translate::TranslateError,
                        > {
                            unreachable!("dry run never translates")
                        }
                    }
                    run_onboard(&resolved, &opts, &AcceptAll, &NeverCalled)?
                } else {
                    let provider = openai_provider(&cfg)?;
                    run_onboard(&resolved, &opts, &AcceptAll, &provider)?
                };

                if let Some(summary) = &outcome.summary {
                    println!(
                        "translated {} / {} candidates ({} fallback)",
                        summary.translated, outcome.total_candidates, summary.fallback
                    );
                    println!(
                        "catalogs updated: app {} (+{} sanitized), widget {} (+{} sanitized)",
                        summary.app_catalog_entries_updated,
                        summary.app_sanitized_keys,
                        summary.widget_catalog_entries_updated,
                        summary.widget_sanitized_keys
                    );
                    if summary.region_added {
                        println!("region registered in project manifest");
                    }
                    if summary.plists_synced > 0 {
                        println!("{} Info.plist file(s) updated", summary.plists_synced);
                    }
                    if !skip_checks {
                        let violations =
                            run_check(&resolved, &check_targets, &source_filter(&cfg))?;
                        for violation in &violations {
                            eprintln!("warning: unlocalized literal {violation}");
                        }
                    }
                    print_ok(use_color, "onboarding complete");
                } else {
                    print_ok(
                        use_color,
                        &format!(
                            "dry run: {} candidates written to {}",
                            outcome.total_candidates,
                            outcome.candidates_path.display()
                        ),
                    );
                }
                Ok(())
            }

            Commands::Check { layout } => {
                let resolved = resolve_layout(&layout, &cfg)?;
                let targets = resolve_targets(&layout, &cfg, &resolved);
                let filter = source_filter(&cfg);
                let violations = run_check(&resolved, &targets, &filter)?;

                if violations.is_empty() {
                    print_ok(use_color, "no unlocalized source-language literals found");
                } else {
                    for violation in &violations {
                        if use_color {
                            use owo_colors::OwoColorize;
                            println!("{} {}", "✖".red(), violation);
                        } else {
                            println!("✖ {violation}");
                        }
                    }
                    eprintln!("{} unlocalized literal(s) found", violations.len());
                    std::process::exit(1);
                }
                Ok(())
            }
        };

        match &result {
            Ok(_) => info!("finished command: {}", cmd_name),
            Err(e) => error!("command {} failed: {:?}", cmd_name, e),
        }

        result
    }
}

fn print_ok(use_color: bool, message: &str) {
    if use_color {
        use owo_colors::OwoColorize;
        println!("{} {}", "✔".green(), message);
    } else {
        println!("✔ {message}");
    }
}

fn init_tracing() {
    let file_appender = rolling::daily("logs", "swiftloc.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    cli.cmd.run(use_color)
}
