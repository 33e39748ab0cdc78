//! PageLingo 命令行入口
//!
//! 读取本地 HTML 页面，按规则解析出生效的规则并执行一次注册，
//! 每个待翻译节点的组装结果以一行 JSON 输出到标准输出。

#[cfg(feature = "cli")]
mod cli {
    use std::fs;
    use std::path::PathBuf;
    use std::process::ExitCode;
    use std::rc::Rc;

    use clap::{CommandFactory, FromArgMatches, Parser};
    use markup5ever_rcdom::Handle;
    use pagelingo::config::{self, ConfigManager, InteractionMode};
    use pagelingo::env::{core::LogLevel, describe_variables, EnvVar};
    use pagelingo::parsers::html::{html_to_dom, serialize_document};
    use pagelingo::rules::{
        parse_rules, resolve_rule, AsKey, CachedSubRuleLoader, FileSubRuleLoader, ResolveOptions,
        ResolvedRule, SubRuleSource,
    };
    use pagelingo::translation::{
        Collaborators, Composition, LifecycleController, PassthroughTranslator, Presenter,
    };
    use pagelingo::Result;
    use tracing_subscriber::EnvFilter;

    /// 订阅规则缓存容量
    const SUBRULE_CACHE_SIZE: usize = 8;

    #[derive(Parser, Debug)]
    #[command(name = "pagelingo", version, about = "Apply per-site translation rules to an HTML page")]
    struct Options {
        /// Rule list (JSON)
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Sub-rule list (JSON) spliced in before the last rule
        #[arg(long, value_name = "FILE")]
        subrules: Option<PathBuf>,

        /// Settings file (TOML or JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Page identifier used for rule matching
        #[arg(long)]
        url: String,

        /// Trigger mode: mk_pageopen, mk_disable, mk_mouseover, mk_ctrlKey, ...
        #[arg(long, value_parser = parse_mode)]
        mode: Option<InteractionMode>,

        /// Print the resolved rule as JSON before processing
        #[arg(long)]
        print_rule: bool,

        /// Write the resulting HTML to FILE
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Charset of the input page
        #[arg(long, default_value = "utf-8")]
        encoding: String,

        /// HTML page to process
        page: PathBuf,
    }

    fn parse_mode(value: &str) -> std::result::Result<InteractionMode, String> {
        InteractionMode::from_key(value).ok_or_else(|| format!("unknown mode '{}'", value))
    }

    /// `--help` 末尾列出可用的环境变量
    fn env_help() -> String {
        let mut help = String::from("Environment variables:\n");
        for (name, description) in describe_variables() {
            help.push_str(&format!("  {:<26} {}\n", name, description));
        }
        help
    }

    fn parse_options() -> Options {
        let matches = Options::command().after_help(env_help()).get_matches();
        Options::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// 每次挂载输出一行 JSON
    struct JsonLinesPresenter;

    impl Presenter for JsonLinesPresenter {
        fn mount(&self, _translation: &Handle, composition: &Composition, rule: &ResolvedRule) {
            let line = serde_json::json!({
                "text": composition.text,
                "keeps": composition.keeps,
                "translator": rule.translator.as_key(),
                "fromLang": rule.from_lang.as_key(),
                "toLang": rule.to_lang.as_key(),
            });
            println!("{}", line);
        }
    }

    fn init_logging() {
        let level = LogLevel::get_or_default("warn".to_string());
        let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    async fn run(options: Options) -> Result<()> {
        let mut setting = match &options.config {
            Some(path) => ConfigManager::from_file(path)?.into_setting(),
            None => config::load_setting(),
        };
        setting.mouse_key = options.mode.unwrap_or(InteractionMode::PageOpen);

        let rules = match &options.rules {
            Some(path) => parse_rules(&fs::read_to_string(path)?)?,
            None => Vec::new(),
        };

        let resolve_options = match &options.subrules {
            Some(path) => ResolveOptions {
                inject_rules: true,
                subrules: vec![SubRuleSource::selected(path.to_string_lossy())],
            },
            None => ResolveOptions {
                inject_rules: setting.inject_rules,
                subrules: setting.subrules.clone(),
            },
        };
        let loader = CachedSubRuleLoader::new(FileSubRuleLoader::new(), SUBRULE_CACHE_SIZE);
        let mut rule = resolve_rule(&rules, &options.url, &resolve_options, &loader).await;

        if options.print_rule {
            println!("{}", serde_json::to_string(&rule)?);
        }

        let data = fs::read(&options.page)?;
        let dom = html_to_dom(&data, &options.encoding)?;

        rule.trans_open = true;
        let collaborators =
            Collaborators::new(Rc::new(PassthroughTranslator), Rc::new(JsonLinesPresenter));
        let controller =
            LifecycleController::new(dom.document.clone(), rule, setting, collaborators).await;
        tracing::info!("共处理 {} 个节点", controller.tracked_nodes().len());

        if let Some(path) = &options.output {
            fs::write(path, serialize_document(&dom.document))?;
        }

        Ok(())
    }

    pub fn main() -> ExitCode {
        let options = parse_options();
        init_logging();

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        };

        match runtime.block_on(run(options)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(feature = "cli")]
fn main() -> std::process::ExitCode {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("Error: CLI feature not enabled. Please compile with --features cli");
    std::process::exit(1);
}
