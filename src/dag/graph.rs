// src/dag/graph.rs

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::config::model::ConfigFile;
use crate::engine::TaskName;
use crate::errors::{BuilddagError, Result};
use crate::transform::{self, Transform};

/// A named unit of work: optional shell command, then
/// resolve sources -> pipeline -> write to `destination`.
#[derive(Clone)]
pub struct TaskDescriptor {
    pub name: TaskName,
    /// Tasks that must succeed first, in declaration order.
    pub prerequisites: Vec<TaskName>,
    pub sources: Vec<String>,
    pub allow_empty: bool,
    pub pipeline: Vec<Arc<dyn Transform>>,
    pub destination: PathBuf,
    pub cmd: Option<String>,
}

impl fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<&str> = self.pipeline.iter().map(|t| t.name()).collect();
        f.debug_struct("TaskDescriptor")
            .field("name", &self.name)
            .field("prerequisites", &self.prerequisites)
            .field("sources", &self.sources)
            .field("allow_empty", &self.allow_empty)
            .field("pipeline", &stages)
            .field("destination", &self.destination)
            .field("cmd", &self.cmd)
            .finish()
    }
}

impl TaskDescriptor {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            prerequisites: Vec::new(),
            sources: Vec::new(),
            allow_empty: false,
            pipeline: Vec::new(),
            destination: PathBuf::from("dist"),
            cmd: None,
        }
    }

    pub fn after(mut self, dep: impl Into<TaskName>) -> Self {
        self.prerequisites.push(dep.into());
        self
    }

    pub fn source(mut self, pattern: impl Into<String>) -> Self {
        self.sources.push(pattern.into());
        self
    }

    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    pub fn pipe(mut self, stage: impl Transform + 'static) -> Self {
        self.pipeline.push(Arc::new(stage));
        self
    }

    pub fn dest(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn cmd(mut self, cmd: impl Into<String>) -> Self {
        self.cmd = Some(cmd.into());
        self
    }
}

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: tasks that must succeed before this one can run.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskName>,
}

/// Validated, immutable task graph in declaration order.
///
/// Construction rejects duplicate names, unknown prerequisites and cycles,
/// so everything downstream can assume a well-formed DAG.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: Vec<TaskDescriptor>,
    index: HashMap<TaskName, usize>,
    nodes: Vec<DagNode>,
}

impl TaskGraph {
    pub fn new(tasks: Vec<TaskDescriptor>) -> Result<Self> {
        let edges: Vec<(&str, &[String])> = tasks
            .iter()
            .map(|t| (t.name.as_str(), t.prerequisites.as_slice()))
            .collect();
        check_structure(&edges)?;

        let index: HashMap<TaskName, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();

        let mut nodes: Vec<DagNode> = tasks
            .iter()
            .map(|t| DagNode {
                deps: t.prerequisites.clone(),
                dependents: Vec::new(),
            })
            .collect();

        for task in tasks.iter() {
            for dep in task.prerequisites.iter() {
                if let Some(&i) = index.get(dep) {
                    nodes[i].dependents.push(task.name.clone());
                }
            }
        }

        Ok(Self {
            tasks,
            index,
            nodes,
        })
    }

    /// Build the runtime graph from a validated [`ConfigFile`].
    ///
    /// Each pipeline entry becomes a concrete transform. Destinations stay
    /// relative; the executor resolves them against the base directory.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let tasks = cfg
            .task
            .iter()
            .map(|tc| TaskDescriptor {
                name: tc.name.clone(),
                prerequisites: tc.after.clone(),
                sources: tc.sources.clone(),
                allow_empty: tc.allow_empty,
                pipeline: tc
                    .pipeline
                    .iter()
                    .map(|spec| transform::from_spec(spec, &cfg.tools))
                    .collect(),
                destination: tc.effective_dest(&cfg.config.output_dir).to_path_buf(),
                cmd: tc.cmd.clone(),
            })
            .collect();
        Self::new(tasks)
    }

    /// All tasks in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.tasks.iter()
    }

    /// Return all task names.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TaskDescriptor> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of `name` in declaration order.
    pub fn declaration_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Immediate dependencies of a task (the tasks listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.index
            .get(name)
            .map(|&i| self.nodes[i].deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task (tasks that list this one in their `after`).
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.index
            .get(name)
            .map(|&i| self.nodes[i].dependents.as_slice())
            .unwrap_or(&[])
    }
}

/// Structural checks shared by config validation and [`TaskGraph::new`].
///
/// `tasks` pairs each task name with its prerequisites, in declaration
/// order. Reports, in this order: duplicate names, unknown prerequisites,
/// and every task that sits on a cycle (self-dependencies included).
pub fn check_structure(tasks: &[(&str, &[String])]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for &(name, _) in tasks {
        if !seen.insert(name) {
            return Err(BuilddagError::DuplicateTask(name.to_string()));
        }
    }

    for &(name, deps) in tasks {
        for dep in deps {
            if !seen.contains(dep.as_str()) {
                return Err(BuilddagError::UnknownTask {
                    task: name.to_string(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    // Edge direction: dep -> task.
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
    for (i, &(name, _)) in tasks.iter().enumerate() {
        nodes.insert(name, graph.add_node(i));
    }
    for &(name, deps) in tasks {
        for dep in deps {
            graph.add_edge(nodes[dep.as_str()], nodes[name], ());
        }
    }

    let mut cyclic: Vec<usize> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(|node| graph[node])
        .collect();

    if cyclic.is_empty() {
        return Ok(());
    }

    cyclic.sort_unstable();
    Err(BuilddagError::DagCycle {
        tasks: cyclic.into_iter().map(|i| tasks[i].0.to_string()).collect(),
    })
}
