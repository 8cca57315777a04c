use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};

use crate::assemble::{compile_plan, CompiledPlan};
use crate::config::CompileOptions;
use crate::graph::PlanInput;

pub fn compute_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// In-memory compile cache keyed by the content of the input and options.
///
/// Compilation is deterministic, so an identical snapshot always maps to the same
/// plan. The cache is owned by the caller; the compiler itself keeps no state.
/// At most `capacity` plans are kept; the oldest insertion is evicted first.
#[derive(Debug)]
pub struct CompileCache {
    entries: HashMap<String, CompiledPlan>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
    capacity: usize,
    hits: usize,
    misses: usize,
}

impl Default for CompileCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero disables storing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stable key for a snapshot, or `None` if it cannot be serialized.
    pub fn cache_key(input: &PlanInput, options: &CompileOptions) -> Option<String> {
        match serde_json::to_string(&(input, options)) {
            Ok(data) => Some(compute_hash(&data)),
            Err(e) => {
                log::warn!("[PlanCompiler] cache key serialization failed: {}", e);
                None
            }
        }
    }

    pub fn get(&self, input: &PlanInput, options: &CompileOptions) -> Option<&CompiledPlan> {
        let key = Self::cache_key(input, options)?;
        self.entries.get(&key)
    }

    pub fn get_or_compile(&mut self, input: &PlanInput, options: &CompileOptions) -> CompiledPlan {
        let Some(key) = Self::cache_key(input, options) else {
            self.misses += 1;
            return compile_plan(input, options);
        };

        if let Some(plan) = self.entries.get(&key) {
            self.hits += 1;
            log::trace!("[PlanCompiler] cache hit {}", key);
            return plan.clone();
        }

        self.misses += 1;
        let plan = compile_plan(input, options);
        self.insert(key, plan.clone());
        plan
    }

    fn insert(&mut self, key: String, plan: CompiledPlan) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            log::trace!("[PlanCompiler] cache evict {}", oldest);
            self.entries.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, plan);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
