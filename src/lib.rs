//! Link-Coach Core
//!
//! Conversation analysis engine for an AI leadership coach:
//! - Classifies each question as on- or off-topic (with category)
//! - Extracts question traits and emotional signals
//! - Places the conversation in one of four coaching stages
//! - Scores engagement and decides when to suggest a human consultant
//! - Selects a response strategy and assembles the generator prompt
//! - Builds interpretation reports from the leadership type catalog
//! - Keeps every decision auditable and replayable
//!
//! FLOW:
//! QUESTION + HISTORY → ANALYZE → STRATEGY → ENGAGEMENT → PROMPT → GENERATE → AUDIT

pub mod analysis;
pub mod api;
pub mod audit;
pub mod classifier;
pub mod coaching;
pub mod config;
pub mod engagement;
pub mod error;
pub mod leadership;
pub mod lexicon;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod retrieval;
pub mod store;
pub mod strategy;

pub use error::{CoachError, Result};

// Re-export common types
pub use analysis::ConversationAnalyzer;
pub use coaching::{CoachingService, CoachingSession, TurnDecision};
pub use leadership::{classify_leadership_type, LeadershipType};
pub use engagement::EngagementScorer;
pub use lexicon::Lexicon;
pub use models::*;
pub use strategy::{select_strategy_key, StrategySelector};
