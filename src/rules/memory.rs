//! In-process rule store with optional JSON persistence.
//!
//! Rules are kept per agent id. Each agent gets its own slot holding an async
//! writer lock and the rule list, so observations for one agent are applied
//! one at a time while other agents proceed independently. Readers never wait
//! on a synthesis in progress.
//!
//! When opened with a data path, each agent's rules live in
//! `<data_path>/strategic_memory/<agent_id>.json` and are reloaded on open.

use crate::rules::store::{Observation, RuleStore};
use crate::rules::synthesizer::RuleSynthesizer;
use crate::types::{AppError, Result, StrategicRule};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MEMORY_DIR: &str = "strategic_memory";

#[derive(Default)]
struct AgentSlot {
    writer: tokio::sync::Mutex<()>,
    rules: RwLock<Vec<StrategicRule>>,
}

pub struct MemoryRuleStore {
    agents: RwLock<HashMap<String, Arc<AgentSlot>>>,
    synthesizer: Option<Arc<dyn RuleSynthesizer>>,
    max_rules_per_agent: usize,
    min_confidence: f32,
    persist_dir: Option<PathBuf>,
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRuleStore {
    /// Empty, non-persistent store without a synthesizer.
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            synthesizer: None,
            max_rules_per_agent: 15,
            min_confidence: 0.0,
            persist_dir: None,
        }
    }

    /// Open a persistent store rooted at `data_path`, loading any saved rules.
    pub fn open(data_path: impl AsRef<Path>) -> Result<Self> {
        let dir = data_path.as_ref().join(MEMORY_DIR);
        std::fs::create_dir_all(&dir)?;

        let mut agents = HashMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let rules: Vec<StrategicRule> = match serde_json::from_str(&content) {
                Ok(rules) => rules,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable rule file");
                    continue;
                }
            };
            let Some(agent_id) = rules.first().map(|r| r.agent_id.clone()) else {
                continue;
            };
            agents.insert(
                agent_id,
                Arc::new(AgentSlot {
                    writer: tokio::sync::Mutex::new(()),
                    rules: RwLock::new(rules),
                }),
            );
        }

        info!(
            path = %dir.display(),
            agents = agents.len(),
            "Opened strategic rule store"
        );

        Ok(Self {
            agents: RwLock::new(agents),
            persist_dir: Some(dir),
            ..Self::new()
        })
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn RuleSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_max_rules_per_agent(mut self, max: usize) -> Self {
        self.max_rules_per_agent = max.max(1);
        self
    }

    pub fn with_min_confidence(mut self, min: f32) -> Self {
        self.min_confidence = min;
        self
    }

    /// Insert a rule directly, bypassing synthesis. Applies the same
    /// duplicate and capacity rules as learned ones.
    pub async fn add_rule(&self, rule: StrategicRule) -> Result<bool> {
        let slot = self.slot(&rule.agent_id);
        let _writer = slot.writer.lock().await;
        self.insert_locked(&slot, rule).await
    }

    /// Drop every rule, including persisted files. Returns how many rules
    /// were removed.
    pub async fn clear(&self) -> Result<usize> {
        let slots: Vec<(String, Arc<AgentSlot>)> = self.agents.write().drain().collect();
        let mut removed = 0;
        for (agent_id, slot) in slots {
            let _writer = slot.writer.lock().await;
            removed += slot.rules.read().len();
            if let Some(path) = self.file_for(&agent_id) {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(removed)
    }

    fn slot(&self, agent_id: &str) -> Arc<AgentSlot> {
        if let Some(slot) = self.agents.read().get(agent_id) {
            return slot.clone();
        }
        self.agents
            .write()
            .entry(agent_id.to_string())
            .or_default()
            .clone()
    }

    fn file_for(&self, agent_id: &str) -> Option<PathBuf> {
        let name: String = agent_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.persist_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", name)))
    }

    /// Caller must hold `slot.writer`.
    async fn insert_locked(&self, slot: &AgentSlot, rule: StrategicRule) -> Result<bool> {
        let snapshot = {
            let mut rules = slot.rules.write();
            let normalized = rule.rule_text.trim().to_lowercase();
            if rules
                .iter()
                .any(|r| r.rule_text.trim().to_lowercase() == normalized)
            {
                debug!(agent = %rule.agent_id, "Dropping duplicate rule");
                return Ok(false);
            }
            rules.push(rule);
            while rules.len() > self.max_rules_per_agent {
                let evicted = rules.remove(0);
                debug!(agent = %evicted.agent_id, rule = %evicted.rule_text, "Evicted oldest rule");
            }
            rules.clone()
        };

        if let Some(first) = snapshot.first() {
            self.persist(&first.agent_id, &snapshot).await?;
        }
        Ok(true)
    }

    async fn persist(&self, agent_id: &str, rules: &[StrategicRule]) -> Result<()> {
        let Some(path) = self.file_for(agent_id) else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(rules)
            .map_err(|e| AppError::Internal(format!("Failed to serialize rules: {}", e)))?;
        tokio::fs::write(&path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn get_rules(&self, agent_id: &str) -> Result<Vec<String>> {
        let Some(slot) = self.agents.read().get(agent_id).cloned() else {
            return Ok(Vec::new());
        };
        let rules = slot.rules.read().iter().map(|r| r.rule_text.clone()).collect();
        Ok(rules)
    }

    async fn record_observation(&self, observation: Observation) -> Result<Option<StrategicRule>> {
        let Some(synthesizer) = self.synthesizer.as_ref() else {
            return Ok(None);
        };

        let slot = self.slot(&observation.agent_id);
        let _writer = slot.writer.lock().await;

        let existing: Vec<String> = slot
            .rules
            .read()
            .iter()
            .map(|r| r.rule_text.clone())
            .collect();

        let Some(proposed) = synthesizer.synthesize(&observation, &existing).await? else {
            return Ok(None);
        };

        if proposed.confidence < self.min_confidence {
            debug!(
                agent = %observation.agent_id,
                confidence = proposed.confidence,
                "Proposed rule below confidence threshold"
            );
            return Ok(None);
        }

        let rule = StrategicRule {
            agent_id: observation.agent_id.clone(),
            rule_text: proposed.rule,
            rationale: proposed.rationale,
            confidence: proposed.confidence,
            created_at: Utc::now(),
        };

        if self.insert_locked(&slot, rule.clone()).await? {
            info!(agent = %rule.agent_id, rule = %rule.rule_text, "Learned strategic rule");
            Ok(Some(rule))
        } else {
            Ok(None)
        }
    }

    async fn all_rules(&self) -> Result<Vec<StrategicRule>> {
        let mut slots: Vec<(String, Arc<AgentSlot>)> = self
            .agents
            .read()
            .iter()
            .map(|(id, slot)| (id.clone(), slot.clone()))
            .collect();
        slots.sort_by(|a, b| a.0.cmp(&b.0));

        let mut rules = Vec::new();
        for (_, slot) in slots {
            rules.extend(slot.rules.read().iter().cloned());
        }
        Ok(rules)
    }
}
