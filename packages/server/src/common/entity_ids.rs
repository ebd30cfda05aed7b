//! Typed ID definitions for all domain entities.
//!
//! This module defines type aliases for each domain entity, providing
//! compile-time type safety for ID usage throughout the application.

// Re-export the core Id type and version markers
pub use super::id::{Id, V4, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Property entities (listings).
pub struct Property;

/// Marker type for Agent entities (listing owners, managed by the upstream
/// auth service).
pub struct Agent;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for Property entities.
pub type PropertyId = Id<Property>;

/// Typed ID for Agent entities.
pub type AgentId = Id<Agent>;
