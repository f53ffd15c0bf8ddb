//! Prompt-block assembly from retrieved contexts

use crate::models::BatchQuery;
use crate::models::RetrievedContext;

/// Assembler for the evidence block injected into the generation prompt.
///
/// Pure string construction, independently testable and decoupled from the
/// network call.
pub struct ContextAssembler {
    max_block_length: usize,
}

impl ContextAssembler {
    #[must_use]
    pub const fn new(max_block_length: usize) -> Self {
        Self { max_block_length }
    }

    /// Build the labeled evidence block for the retained contexts.
    ///
    /// Returns an empty string when there are no contexts; the orchestrator
    /// then falls back to the unaugmented base prompt.
    #[must_use]
    pub fn assemble(&self, contexts: &[RetrievedContext], query: &BatchQuery) -> String {
        if contexts.is_empty() {
            return String::new();
        }

        let mut block = String::from(
            "IMPORTANT: Use the following expert flower care information to make more \
             accurate predictions and provide specific, actionable recommendations.\n",
        );

        for ctx in contexts {
            let entry = self.format_context(ctx);
            if block.len() + entry.len() > self.max_block_length {
                break;
            }
            block.push_str(&entry);
        }

        block.push_str(&format!(
            "\nBATCH INFORMATION:\n\
             - Flower Type: {}\n\
             - Variety: {}\n\
             - Storage Environment: {}\n\
             - Initial Condition: {}\n\
             - Floral Food Used: {}\n",
            query.flower_type,
            query.variety.as_deref().unwrap_or("Not specified"),
            query
                .storage_environment
                .map_or("Not specified", |s| s.as_str()),
            query
                .initial_condition
                .map_or("Not specified", |c| c.as_str()),
            if query.floral_food_used { "Yes" } else { "No" },
        ));

        block.push_str(
            "\nBased on the expert care information above, provide:\n\
             1. More precise spoilage predictions considering the specific care requirements\n\
             2. Detailed, actionable recommendations based on the flower's specific needs\n\
             3. Specific care tips that address the flower's unique characteristics\n\
             4. Any special considerations mentioned in the care information\n\
             \n\
             Ensure your recommendations are specific to this flower type and variety, \
             not generic advice.\n",
        );

        block
    }

    /// Format a single context as a labeled block
    fn format_context(&self, ctx: &RetrievedContext) -> String {
        let header = match &ctx.variety {
            Some(variety) => format!(
                "{} ({})",
                ctx.flower_type.to_uppercase(),
                variety
            ),
            None => ctx.flower_type.to_uppercase(),
        };

        format!(
            "\nSPECIFIC CARE INFORMATION FOR {}:\n\
             - Care Requirements: {}\n\
             - Optimal Conditions: {}\n\
             - Common Issues: {}\n\
             - Vase Life Tips: {}\n\
             - Source: {}\n",
            header,
            ctx.care_requirements,
            ctx.optimal_conditions,
            ctx.common_issues,
            ctx.vase_life_tips,
            ctx.sources
                .first()
                .map_or("Unknown", |s| s.name.as_str()),
        )
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(4000)
    }
}
