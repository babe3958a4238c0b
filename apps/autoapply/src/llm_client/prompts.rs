// Cross-cutting prompt fragments shared by every LLM caller.

/// Keeps rewritten content honest to the source CV.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the candidate's CV. \
    Do NOT invent employers, titles, dates, degrees, or metrics. \
    You may reorder, rephrase and emphasise existing material to match the role.";
