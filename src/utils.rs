//! # Utilities Module
//!
//! ## Purpose
//! Common utility functions and helpers used throughout the legal search engine
//! for text processing, performance monitoring, and system operations.
//!
//! ## Key Features
//! - Character-counted text truncation and preview for Chinese text (byte
//!   slicing would panic mid-codepoint)
//! - Performance measurement helpers
//! - System information functions
//! - Validation and sanitization

use std::time::Instant;

/// Performance timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: String,
}

/// Text processing utilities
pub struct TextUtils;

/// System utilities
pub struct SystemUtils;

impl Timer {
    /// Start a new timer with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop timer and log duration
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("Timer '{}' completed in {}ms", self.name, elapsed);
        elapsed
    }
}

impl TextUtils {
    /// Truncate text to `max_chars` Han/ASCII characters, appending `...`.
    /// Counts codepoints rather than bytes so a CJK string is never split
    /// mid-character.
    pub fn truncate(text: &str, max_chars: usize) -> String {
        let char_count = text.chars().count();
        if char_count <= max_chars {
            text.to_string()
        } else {
            let head: String = text.chars().take(max_chars).collect();
            format!("{head}...")
        }
    }

    /// Extract a preview from longer article content by character count
    /// rather than whitespace-separated words — Chinese text carries no
    /// word-separating spaces.
    pub fn extract_preview(text: &str, max_chars: usize) -> String {
        Self::truncate(text.trim(), max_chars)
    }

    /// Sanitize text for safe display by dropping control characters.
    pub fn sanitize(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect()
    }

    /// Count Han/ASCII characters in text (not byte length).
    pub fn char_count(text: &str) -> usize {
        text.chars().count()
    }

    /// Generate text hash for caching.
    pub fn text_hash(text: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}

impl SystemUtils {
    /// Format bytes as human-readable string
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Format duration as human-readable string
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{hours}h {minutes}m {seconds}s")
        } else if minutes > 0 {
            format!("{minutes}m {seconds}s")
        } else {
            format!("{seconds}s")
        }
    }
}

/// Validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate a search query's length, counting Han/ASCII characters
    /// rather than bytes (a short Chinese query like "合同法" is 3 chars
    /// but 9 bytes).
    pub fn is_valid_search_query(query: &str, min_chars: usize, max_chars: usize) -> bool {
        let trimmed = query.trim();
        let char_count = trimmed.chars().count();
        !trimmed.is_empty() && char_count >= min_chars && char_count <= max_chars
    }

    /// Sanitize filename for safe file operations
    pub fn sanitize_filename(filename: &str) -> String {
        filename
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// Macro for timing code blocks
#[macro_export]
macro_rules! time_block {
    ($name:expr, $block:block) => {{
        let timer = $crate::utils::Timer::new($name);
        let result = $block;
        timer.stop();
        result
    }};
}
