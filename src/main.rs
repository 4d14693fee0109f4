use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use l10n_editor::{
    CloseDecision, EditSession, EditorSettings, JsonImporter, Language, LocalizableId, SystemClock,
    ValueSet, ValueSetField,
};

#[derive(Parser)]
#[command(name = "l10n_editor")]
#[command(about = "编辑多语言本地化项目（JSON 布局）")]
#[command(version = "0.1.0")]
struct Cli {
    /// 项目根目录
    #[arg(short, long)]
    project: PathBuf,

    /// 列出所有分组
    #[arg(long)]
    list: bool,

    /// 搜索 key / 注释 / 取值
    #[arg(long)]
    search: Option<String>,

    /// 设置取值：KEY LANG VALUE（key 不存在时新建）
    #[arg(long, num_args = 3, value_names = ["KEY", "LANG", "VALUE"])]
    set: Option<Vec<String>>,

    /// 目标分组名称（默认为第一个分组）
    #[arg(long = "in")]
    target: Option<String>,

    /// 为目标分组添加语言
    #[arg(long)]
    add_language: Option<String>,

    /// 配置文件（JSON）
    #[arg(long)]
    settings: Option<PathBuf>,

    /// 静默模式(仅输出警告和错误)
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    validate_project(&cli.project)?;
    let settings = load_settings(cli.settings.as_deref())?;

    let mut session = EditSession::open(
        &cli.project,
        Arc::new(JsonImporter::new()),
        settings,
        Arc::new(SystemClock),
    )
    .with_context(|| format!("打开项目失败: {:?}", cli.project))?;

    let all: Vec<LocalizableId> = (0..session.localizables().len()).map(LocalizableId).collect();
    let report = session.load_localizables(&all);
    for (file, e) in &report.failed {
        eprintln!("警告: 文件 {} 读取失败: {}", file, e);
    }

    if cli.list {
        print_localizables(&session);
    }

    if let Some(language) = &cli.add_language {
        let target = resolve_target(&session, cli.target.as_deref())?;
        let index = session.localizable(target).map(|l| l.files.len()).unwrap_or(0);
        if session.add_language(Language::new(language.as_str()), index, None, Some(target))? {
            println!("已添加语言 {}", language);
        } else {
            println!("语言 {} 已存在", language);
        }
    }

    if let Some(args) = &cli.set {
        let target = resolve_target(&session, cli.target.as_deref())?;
        handle_set(&mut session, target, args)?;
    }

    if let Some(query) = &cli.search {
        handle_search(&mut session, query);
    }

    let report = session.save_all();
    if !cli.quiet && !report.saved.is_empty() {
        println!("已保存 {} 个文件", report.saved.len());
    }
    for (file, e) in &report.failed {
        eprintln!("错误: 文件 {} 保存失败: {}", file, e);
    }
    if !report.is_success() {
        bail!("{} 个文件保存失败", report.failed.len());
    }

    session.close(CloseDecision::Save)?;
    Ok(())
}

/// 安装日志订阅器（RUST_LOG 优先）
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// 验证项目目录
fn validate_project(project: &Path) -> Result<()> {
    if !project.exists() {
        bail!("项目目录不存在: {:?}", project);
    }
    if !project.is_dir() {
        bail!("项目路径必须是目录: {:?}", project);
    }
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<EditorSettings> {
    match path {
        Some(path) => EditorSettings::load_from_file(path)
            .with_context(|| format!("读取配置失败: {:?}", path)),
        None => Ok(EditorSettings::default()),
    }
}

fn resolve_target(session: &EditSession, name: Option<&str>) -> Result<LocalizableId> {
    match name {
        Some(name) => session
            .localizables()
            .iter()
            .position(|l| l.name == name)
            .map(LocalizableId)
            .with_context(|| format!("找不到分组: {}", name)),
        None => session.selected().context("项目中没有任何分组"),
    }
}

fn print_localizables(session: &EditSession) {
    println!("=== 分组 ({}) ===", session.localizables().len());
    for localizable in session.localizables() {
        let languages: Vec<String> = localizable.languages().iter().map(|l| l.to_string()).collect();
        println!(
            "{}{} [{:?}] {:?} - {} 个条目, 语言: {}",
            localizable.name,
            if localizable.localized { "" } else { " (未本地化)" },
            localizable.kind,
            localizable.status,
            localizable.value_sets.len(),
            languages.join(", ")
        );
    }
}

fn handle_set(session: &mut EditSession, target: LocalizableId, args: &[String]) -> Result<()> {
    let [key, language, value] = args else {
        bail!("--set 需要三个参数: KEY LANG VALUE");
    };
    let language = Language::new(language.as_str());

    let existing = session
        .localizable(target)
        .and_then(|l| l.value_sets.iter().find(|vs| &vs.key == key))
        .map(|vs| vs.id());

    let applied = match existing {
        Some(id) => session.update_value_set_field(
            Some(target),
            id,
            ValueSetField::Value(language.clone()),
            value.as_str(),
        )?,
        None => session.add_value_sets(
            vec![ValueSet::new(key.as_str()).with_value(language.clone(), value.as_str())],
            Some(target),
        )?,
    };

    if applied {
        println!("{} [{}] = {}", key, language, value);
    } else {
        println!("{} [{}] 未变化", key, language);
    }
    Ok(())
}

/// 等待查询防抖结束后打印结果
fn handle_search(session: &mut EditSession, query: &str) {
    session.set_search_query(query);
    while session.search_query() != query {
        let Some(deadline) = session.next_deadline() else {
            break;
        };
        std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        session.poll();
    }

    println!("=== 搜索 \"{}\": {} 个结果 ===", query, session.search_results().len());
    for hit in session.search_results() {
        if let Some(localizable) = session.localizable(hit.localizable) {
            if let Some(value_set) = localizable.value_set(hit.value_set) {
                println!("{} / {}", localizable.name, value_set.key);
                for language in localizable.languages() {
                    println!("  [{}] {}", language, value_set.text(&language));
                }
            }
        }
    }
}
