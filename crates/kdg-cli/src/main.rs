//! CLI binary for KDG: load, query, and plan over knowledge dependency graphs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kdg_core::config::KdgConfig;
use kdg_core::filter::{NodeFilter, filter_nodes};
use kdg_core::graph::{ConceptGraph, ConceptNode, DependencyEdge, EdgeKind, GraphSnapshot, NodeKind};
use kdg_core::storage;
use kdg_overlay::curriculum::{CurriculumMapping, CurriculumOverlay, EducationSystem};
use kdg_overlay::exam::{ExamOverlay, ExamProfile};
use kdg_plan::diagnostics::{DiagnosticsEngine, ProgressUpdate, StudyPath};
use kdg_plan::planner;
use kdg_plan::validate::{validate_graph, validate_snapshot};
use std::path::{Path, PathBuf};

const EXAMS_FILE: &str = "exams.json";
const CURRICULA_FILE: &str = "curricula.json";
const PROGRESS_DIR: &str = "progress";

#[derive(Parser)]
#[command(name = "kdg", about = "Knowledge dependency graph engine")]
struct Cli {
    /// Data root directory holding .kdg/ (defaults to current directory)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show graph statistics
    Info,

    /// Fetch detailed info about a single concept
    Node {
        /// Concept ID
        id: String,
    },

    /// List prerequisites of a concept
    Prereqs {
        /// Concept ID
        id: String,

        /// Follow the full transitive closure instead of direct edges
        #[arg(long)]
        transitive: bool,
    },

    /// List Requires cycles in the graph
    Cycles,

    /// Run the offline integrity pass and print the structured report
    Validate,

    /// List concepts matching the given filters
    Filter {
        /// Keep concepts in at least one of these domains (repeatable)
        #[arg(long)]
        domain: Vec<String>,

        /// Keep concepts carrying at least one of these tags (repeatable)
        #[arg(long)]
        tag: Vec<String>,

        /// Keep concepts of these kinds (repeatable)
        #[arg(long)]
        kind: Vec<String>,

        /// Inclusive complexity lower bound
        #[arg(long, default_value_t = 0.0)]
        min_complexity: f64,

        /// Inclusive complexity upper bound
        #[arg(long, default_value_t = 10.0)]
        max_complexity: f64,

        /// Maximum number of results
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Classify a user's gaps over a target set and its prerequisites
    Gaps {
        #[arg(short, long)]
        user: String,

        /// Target concept IDs (repeatable)
        #[arg(short, long, required = true)]
        target: Vec<String>,
    },

    /// Generate an ordered study path for targets, an exam, or a curriculum
    Path {
        #[arg(short, long)]
        user: String,

        /// Target concept IDs (repeatable; alternative to --exam/--system)
        #[arg(short, long)]
        target: Vec<String>,

        /// Plan for an exam profile instead of explicit targets
        #[arg(long)]
        exam: Option<String>,

        /// Plan for a curriculum: education system (with --year)
        #[arg(long)]
        system: Option<String>,

        /// Curriculum year level (with --system)
        #[arg(long)]
        year: Option<u8>,

        /// Include the profile's optional concepts
        #[arg(long)]
        include_optional: bool,

        /// Re-sort the path so weaker-confidence concepts come earlier
        #[arg(long)]
        optimize: bool,

        /// Days remaining: adds a daily-load feasibility check
        #[arg(long)]
        days: Option<u32>,

        /// Daily study ceiling in hours, used with --days
        #[arg(long, default_value_t = 2.0)]
        max_daily_hours: f64,
    },

    /// Recommend the next concepts to study
    Next {
        #[arg(short, long)]
        user: String,

        /// Target concept IDs (repeatable)
        #[arg(short, long, required = true)]
        target: Vec<String>,

        /// Maximum recommendations (defaults to the configured limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Record a progress update for one (user, concept) pair
    Progress {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        concept: String,

        /// New confidence in [0, 1]; omit to leave unchanged
        #[arg(long)]
        confidence: Option<f64>,

        /// Study minutes to add to the running total
        #[arg(long)]
        minutes: Option<f64>,
    },

    /// List concepts due for review
    Review {
        #[arg(short, long)]
        user: String,

        /// Days since last review (defaults to the configured interval)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Spread a study path over the remaining days
    Schedule {
        #[arg(short, long)]
        user: String,

        /// Target concept IDs (repeatable; alternative to --exam)
        #[arg(short, long)]
        target: Vec<String>,

        /// Schedule for an exam profile instead of explicit targets
        #[arg(long)]
        exam: Option<String>,

        /// Include the profile's optional concepts
        #[arg(long)]
        include_optional: bool,

        /// Days remaining until the deadline
        #[arg(long)]
        days: u32,
    },

    /// Score how much of an exam's concept sets a user already knows
    Coverage {
        #[arg(long)]
        exam: String,

        #[arg(short, long)]
        user: String,
    },

    /// Compare the required sets and depth demands of two exam profiles
    Compare {
        /// First exam ID
        left: String,

        /// Second exam ID
        right: String,
    },

    /// Rank targets by prerequisite depth, deepest first
    Critical {
        /// Target concept IDs (repeatable)
        #[arg(short, long, required = true)]
        target: Vec<String>,
    },

    /// Build the graph from a JSON array of concept records
    Ingest {
        /// Path to the JSON file
        file: PathBuf,
    },
}

fn get_data_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.data {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let root = get_data_root(&cli)?;
    let config = KdgConfig::load(&root)?;

    match cli.command {
        Commands::Info => cmd_info(&root, &config),
        Commands::Node { id } => cmd_node(&root, &config, &id),
        Commands::Prereqs { id, transitive } => cmd_prereqs(&root, &config, &id, transitive),
        Commands::Cycles => cmd_cycles(&root, &config),
        Commands::Validate => cmd_validate(&root, &config),
        Commands::Filter {
            domain,
            tag,
            kind,
            min_complexity,
            max_complexity,
            limit,
        } => cmd_filter(
            &root,
            &config,
            NodeFilter {
                domains: domain,
                tags: tag,
                kinds: kind
                    .iter()
                    .map(|k| parse_kind(k))
                    .collect::<Result<Vec<_>>>()?,
                min_complexity,
                max_complexity,
                limit,
            },
        ),
        Commands::Gaps { user, target } => cmd_gaps(&root, &config, &user, &target),
        Commands::Path {
            user,
            target,
            exam,
            system,
            year,
            include_optional,
            optimize,
            days,
            max_daily_hours,
        } => cmd_path(
            &root,
            &config,
            &user,
            PathScope {
                targets: target,
                exam,
                system,
                year,
                include_optional,
            },
            optimize,
            days,
            max_daily_hours,
        ),
        Commands::Next {
            user,
            target,
            limit,
        } => cmd_next(&root, &config, &user, &target, limit),
        Commands::Progress {
            user,
            concept,
            confidence,
            minutes,
        } => cmd_progress(&root, &config, &user, &concept, confidence, minutes),
        Commands::Review { user, days } => cmd_review(&root, &config, &user, days),
        Commands::Schedule {
            user,
            target,
            exam,
            include_optional,
            days,
        } => cmd_schedule(
            &root,
            &config,
            &user,
            PathScope {
                targets: target,
                exam,
                system: None,
                year: None,
                include_optional,
            },
            days,
        ),
        Commands::Coverage { exam, user } => cmd_coverage(&root, &config, &exam, &user),
        Commands::Compare { left, right } => cmd_compare(&root, &config, &left, &right),
        Commands::Critical { target } => cmd_critical(&root, &config, &target),
        Commands::Ingest { file } => cmd_ingest(&root, &config, &file),
    }
}

fn parse_kind(s: &str) -> Result<NodeKind> {
    match s.to_ascii_lowercase().as_str() {
        "concept" => Ok(NodeKind::Concept),
        "formula" => Ok(NodeKind::Formula),
        "theorem" => Ok(NodeKind::Theorem),
        "definition" => Ok(NodeKind::Definition),
        "identity" => Ok(NodeKind::Identity),
        "proof" => Ok(NodeKind::Proof),
        "symbol" => Ok(NodeKind::Symbol),
        other => anyhow::bail!(
            "unknown node kind: {}. Use concept, formula, theorem, definition, identity, proof, or symbol.",
            other
        ),
    }
}

fn load_graph(root: &Path, config: &KdgConfig) -> Result<ConceptGraph> {
    if !storage::graph_exists_with_config(root, &config.storage) {
        anyhow::bail!("No graph found. Run `kdg ingest <file>` first.");
    }
    storage::load_with_config(root, &config.storage)
}

fn load_exams(root: &Path, config: &KdgConfig) -> Result<ExamOverlay> {
    let path = storage::data_dir_with_config(root, &config.storage).join(EXAMS_FILE);
    let mut overlay = ExamOverlay::new();
    if path.exists() {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let profiles: Vec<ExamProfile> = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        overlay.load_profiles(profiles);
    }
    Ok(overlay)
}

fn load_curricula(root: &Path, config: &KdgConfig) -> Result<CurriculumOverlay> {
    let path = storage::data_dir_with_config(root, &config.storage).join(CURRICULA_FILE);
    let mut overlay = CurriculumOverlay::new();
    if path.exists() {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mappings: Vec<CurriculumMapping> = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        overlay.load_mappings(mappings);
    }
    Ok(overlay)
}

fn progress_file(root: &Path, config: &KdgConfig, user_id: &str) -> PathBuf {
    storage::data_dir_with_config(root, &config.storage)
        .join(PROGRESS_DIR)
        .join(format!("{user_id}.json"))
}

/// Diagnostics engine preloaded with one user's persisted progress.
fn load_diagnostics(root: &Path, config: &KdgConfig, user_id: &str) -> Result<DiagnosticsEngine> {
    let mut engine = DiagnosticsEngine::from_config(&config.planner);
    let path = progress_file(root, config, user_id);
    if path.exists() {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let records = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        engine.import_progress(user_id, records);
    }
    Ok(engine)
}

fn save_diagnostics(
    root: &Path,
    config: &KdgConfig,
    engine: &DiagnosticsEngine,
    user_id: &str,
) -> Result<()> {
    let path = progress_file(root, config, user_id);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string(&engine.export_progress(user_id))?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn load_snapshot(root: &Path, config: &KdgConfig) -> Result<GraphSnapshot> {
    if !storage::graph_exists_with_config(root, &config.storage) {
        anyhow::bail!("No graph found. Run `kdg ingest <file>` first.");
    }
    storage::load_snapshot_with_config(root, &config.storage)
}

/// Load the graph for study-path generation, gated on the snapshot-level
/// integrity pass. Validating before the rebuild also catches duplicate
/// node IDs, which the keyed map cannot represent; errors block, warnings
/// do not.
fn load_validated_graph(root: &Path, config: &KdgConfig) -> Result<ConceptGraph> {
    let snapshot = load_snapshot(root, config)?;
    let report = validate_snapshot(&snapshot);
    if !report.valid {
        anyhow::bail!(
            "graph failed validation with {} error(s). Run `kdg validate` for details.",
            report.errors.len()
        );
    }
    Ok(ConceptGraph::from_snapshot(snapshot))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_info(root: &Path, config: &KdgConfig) -> Result<()> {
    if !storage::graph_exists_with_config(root, &config.storage) {
        eprintln!("No graph found. Run `kdg ingest <file>` first.");
        return Ok(());
    }
    let graph = storage::load_with_config(root, &config.storage)?;

    println!("KDG v{}", graph.version);
    println!("Created: {}", graph.created_at);
    println!("Updated: {}", graph.updated_at);
    println!();
    println!("Concepts: {}", graph.metadata.total_nodes);
    println!("Edges: {}", graph.metadata.total_edges);
    println!("Requires edges: {}", graph.metadata.requires_edges);
    if !graph.metadata.nodes_by_kind.is_empty() {
        println!("\nBy kind:");
        for (kind, count) in &graph.metadata.nodes_by_kind {
            println!("  {} ({})", kind, count);
        }
    }
    Ok(())
}

fn cmd_node(root: &Path, config: &KdgConfig, id: &str) -> Result<()> {
    let graph = load_graph(root, config)?;
    let Some(node) = graph.node(id) else {
        eprintln!("Concept not found: {}", id);
        return Ok(());
    };

    println!("Concept: {}", node.title);
    println!("ID: {}", node.id);
    println!("Kind: {}", node.kind.as_str());
    println!("Complexity: {}", node.complexity);
    if !node.domains.is_empty() {
        println!("Domains: {}", node.domains.join(", "));
    }
    if !node.tags.is_empty() {
        println!("Tags: {}", node.tags.join(", "));
    }
    if !node.description.is_empty() {
        println!("\n{}", node.description);
    }

    let prereqs = graph.prerequisites(id);
    if !prereqs.is_empty() {
        let ids: Vec<&str> = prereqs.iter().map(|n| n.id.as_str()).collect();
        println!("\nRequires: {}", ids.join(", "));
    }
    let dependents = graph.dependents(id);
    if !dependents.is_empty() {
        let ids: Vec<&str> = dependents.iter().map(|n| n.id.as_str()).collect();
        println!("Required by: {}", ids.join(", "));
    }
    Ok(())
}

fn cmd_prereqs(root: &Path, config: &KdgConfig, id: &str, transitive: bool) -> Result<()> {
    let graph = load_graph(root, config)?;
    let prereqs = if transitive {
        graph.all_prerequisites(id)
    } else {
        graph.prerequisites(id)
    };

    if prereqs.is_empty() {
        eprintln!("No prerequisites found for: {}", id);
        return Ok(());
    }
    for node in prereqs {
        println!("{} [{}] (complexity {})", node.id, node.kind.as_str(), node.complexity);
    }
    Ok(())
}

fn cmd_cycles(root: &Path, config: &KdgConfig) -> Result<()> {
    let graph = load_graph(root, config)?;
    let cycles = graph.detect_cycles();

    if cycles.is_empty() {
        eprintln!("No cycles found. The graph is a valid DAG.");
        return Ok(());
    }
    for cycle in &cycles {
        println!("{}", cycle.join(" -> "));
    }
    eprintln!("\nFound {} cycle(s).", cycles.len());
    Ok(())
}

fn cmd_validate(root: &Path, config: &KdgConfig) -> Result<()> {
    let snapshot = load_snapshot(root, config)?;
    let report = validate_snapshot(&snapshot);
    print_json(&report)?;

    if report.valid {
        eprintln!("Graph is valid ({} warning(s)).", report.warnings.len());
    } else {
        eprintln!(
            "Found {} error(s) and {} warning(s).",
            report.errors.len(),
            report.warnings.len()
        );
    }
    Ok(())
}

fn cmd_filter(root: &Path, config: &KdgConfig, filter: NodeFilter) -> Result<()> {
    let graph = load_graph(root, config)?;
    let nodes = filter_nodes(&graph, &filter);

    if nodes.is_empty() {
        eprintln!("No concepts matched.");
        return Ok(());
    }
    for node in nodes {
        println!(
            "{} [{}] (complexity {}) {}",
            node.id,
            node.kind.as_str(),
            node.complexity,
            node.title
        );
    }
    Ok(())
}

fn cmd_gaps(root: &Path, config: &KdgConfig, user: &str, targets: &[String]) -> Result<()> {
    let graph = load_graph(root, config)?;
    let engine = load_diagnostics(root, config, user)?;
    print_json(&engine.detect_gaps(user, &graph, targets))
}

/// Where a plan's targets come from: explicit IDs, an exam profile, or a
/// curriculum (system, year) pair.
struct PathScope {
    targets: Vec<String>,
    exam: Option<String>,
    system: Option<String>,
    year: Option<u8>,
    include_optional: bool,
}

fn build_path(
    root: &Path,
    config: &KdgConfig,
    graph: &ConceptGraph,
    engine: &DiagnosticsEngine,
    user: &str,
    scope: &PathScope,
) -> Result<StudyPath> {
    if let Some(exam_id) = &scope.exam {
        let exams = load_exams(root, config)?;
        if exams.profile(exam_id).is_none() {
            eprintln!("Exam not found: {}", exam_id);
        }
        return Ok(planner::plan_for_exam(
            graph,
            &exams,
            exam_id,
            engine,
            user,
            scope.include_optional,
        ));
    }
    if let Some(system) = &scope.system {
        let year = scope
            .year
            .ok_or_else(|| anyhow::anyhow!("--system requires --year"))?;
        let system: EducationSystem = system.parse()?;
        let curricula = load_curricula(root, config)?;
        return Ok(planner::plan_for_curriculum(
            graph,
            &curricula,
            system,
            year,
            engine,
            user,
            scope.include_optional,
        ));
    }
    if scope.targets.is_empty() {
        anyhow::bail!("Nothing to plan: pass --target, --exam, or --system/--year.");
    }
    Ok(engine.generate_study_path(user, graph, &scope.targets))
}

fn cmd_path(
    root: &Path,
    config: &KdgConfig,
    user: &str,
    scope: PathScope,
    optimize: bool,
    days: Option<u32>,
    max_daily_hours: f64,
) -> Result<()> {
    let graph = load_validated_graph(root, config)?;
    let engine = load_diagnostics(root, config, user)?;

    let path = build_path(root, config, &graph, &engine, user, &scope)?;
    print_json(&path)?;

    if optimize {
        let ids: Vec<String> = path.sequence.iter().map(|s| s.concept_id.clone()).collect();
        let optimized = planner::optimize_order(&graph, &ids, &engine, user);
        print_json(&optimized)?;
    }
    if let Some(days) = days {
        let load = planner::daily_load(path.total_hours, days, max_daily_hours);
        print_json(&load)?;
        if !load.feasible {
            eprintln!(
                "Warning: {:.1} h/day exceeds the {:.1} h/day ceiling.",
                load.daily_hours, max_daily_hours
            );
        }
    }
    Ok(())
}

fn cmd_next(
    root: &Path,
    config: &KdgConfig,
    user: &str,
    targets: &[String],
    limit: Option<usize>,
) -> Result<()> {
    let graph = load_validated_graph(root, config)?;
    let engine = load_diagnostics(root, config, user)?;

    let limit = limit.unwrap_or(config.planner.recommend_limit);
    let recommendations = engine.recommend_next(user, &graph, targets, limit);
    if recommendations.is_empty() {
        eprintln!("Nothing to recommend: all targets and prerequisites are known.");
        return Ok(());
    }
    print_json(&recommendations)
}

fn cmd_progress(
    root: &Path,
    config: &KdgConfig,
    user: &str,
    concept: &str,
    confidence: Option<f64>,
    minutes: Option<f64>,
) -> Result<()> {
    if let Some(c) = confidence
        && !(0.0..=1.0).contains(&c)
    {
        anyhow::bail!("confidence ({}) must be in [0, 1]", c);
    }

    let mut engine = load_diagnostics(root, config, user)?;
    engine.update_progress(
        user,
        concept,
        ProgressUpdate {
            confidence,
            time_spent_minutes: minutes,
            reviewed_at: None,
        },
    );
    save_diagnostics(root, config, &engine, user)?;

    if let Some(record) = engine.record(user, concept) {
        print_json(record)?;
    }
    Ok(())
}

fn cmd_review(root: &Path, config: &KdgConfig, user: &str, days: Option<i64>) -> Result<()> {
    let engine = load_diagnostics(root, config, user)?;
    let days = days.unwrap_or(config.planner.review_interval_days);
    let due = engine.needs_review(user, days);

    if due.is_empty() {
        eprintln!("Nothing due for review.");
        return Ok(());
    }
    print_json(&due)
}

fn cmd_schedule(
    root: &Path,
    config: &KdgConfig,
    user: &str,
    scope: PathScope,
    days: u32,
) -> Result<()> {
    let graph = load_validated_graph(root, config)?;
    let engine = load_diagnostics(root, config, user)?;

    let path = build_path(root, config, &graph, &engine, user, &scope)?;
    let ids: Vec<String> = path.sequence.iter().map(|s| s.concept_id.clone()).collect();
    let slots = planner::review_schedule(&ids, days);

    if slots.is_empty() {
        eprintln!("Nothing to schedule.");
        return Ok(());
    }
    print_json(&slots)?;
    eprintln!(
        "\n{} concept(s), {:.0} h total over {} day(s).",
        ids.len(),
        path.total_hours,
        slots.len()
    );
    Ok(())
}

fn cmd_coverage(root: &Path, config: &KdgConfig, exam_id: &str, user: &str) -> Result<()> {
    let exams = load_exams(root, config)?;
    let engine = load_diagnostics(root, config, user)?;

    match exams.coverage(exam_id, &engine.known_concepts(user)) {
        Some(report) => print_json(&report),
        None => {
            eprintln!("Exam not found: {}", exam_id);
            Ok(())
        }
    }
}

fn cmd_compare(root: &Path, config: &KdgConfig, left: &str, right: &str) -> Result<()> {
    let exams = load_exams(root, config)?;
    match exams.compare(left, right) {
        Some(comparison) => print_json(&comparison),
        None => {
            eprintln!("Exam not found: {} or {}", left, right);
            Ok(())
        }
    }
}

fn cmd_critical(root: &Path, config: &KdgConfig, targets: &[String]) -> Result<()> {
    let graph = load_graph(root, config)?;
    print_json(&planner::critical_path(&graph, targets))
}

/// Build the graph wholesale from a JSON array of concept records. Each
/// malformed record is logged and skipped; the batch always completes.
/// Relation lists on the records are materialized as typed edges.
fn cmd_ingest(root: &Path, config: &KdgConfig, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let records: Vec<serde_json::Value> =
        serde_json::from_str(&raw).context("expected a JSON array of concept records")?;
    let record_count = records.len();

    let mut nodes: Vec<ConceptNode> = Vec::new();
    let mut skipped = 0usize;
    for (index, value) in records.into_iter().enumerate() {
        match serde_json::from_value::<ConceptNode>(value) {
            Ok(node) => {
                if !(0.0..=10.0).contains(&node.complexity) {
                    tracing::warn!(
                        record = index,
                        id = %node.id,
                        complexity = node.complexity,
                        "complexity outside [0, 10], record skipped"
                    );
                    skipped += 1;
                    continue;
                }
                nodes.push(node);
            }
            Err(err) => {
                tracing::warn!(record = index, error = %err, "malformed concept record skipped");
                skipped += 1;
            }
        }
    }

    let mut edges: Vec<DependencyEdge> = Vec::new();
    for node in &nodes {
        for prereq in &node.requires {
            edges.push(relation_edge(prereq, &node.id, EdgeKind::Requires));
        }
        for target in &node.generalizes {
            edges.push(relation_edge(&node.id, target, EdgeKind::Generalizes));
        }
        for target in &node.special_cases {
            edges.push(relation_edge(&node.id, target, EdgeKind::SpecialCaseOf));
        }
        for target in &node.used_in {
            edges.push(relation_edge(&node.id, target, EdgeKind::UsedIn));
        }
    }

    let mut graph = ConceptGraph::new();
    for node in nodes {
        graph.insert_node(node);
    }
    for edge in edges {
        graph.insert_edge(edge);
    }
    graph.refresh_metadata();
    storage::save_with_config(root, &graph, &config.storage)?;

    eprintln!("Graph built from {}:", file.display());
    eprintln!("  Records: {}", record_count);
    eprintln!("  Concepts: {}", graph.metadata.total_nodes);
    eprintln!("  Edges: {}", graph.metadata.total_edges);
    if skipped > 0 {
        eprintln!("  Skipped: {} malformed record(s)", skipped);
    }

    let report = validate_graph(&graph);
    if !report.valid {
        eprintln!(
            "\nWarning: the graph has {} integrity error(s). Run `kdg validate`.",
            report.errors.len()
        );
    }
    Ok(())
}

fn relation_edge(from: &str, to: &str, kind: EdgeKind) -> DependencyEdge {
    DependencyEdge {
        from: from.to_string(),
        to: to.to_string(),
        kind,
        weight: 1.0,
        metadata: None,
    }
}
