use crate::corpus::Passage;

/// Shape of the JSON object the model is asked to return.
pub const COREP_SCHEMA: &str = r#"{
    "own_funds": {
        "common_equity_tier_1": <float>,
        "additional_tier_1": <float>,
        "tier_2": <float>,
        "total_own_funds": <float>
    },
    "audit_log": [
        {
            "field": "<field_name>",
            "value": <float>,
            "rule_ids": ["<rule_id_1>", "<rule_id_2>"],
            "explanation": "<reasoning for this value>"
        }
    ],
    "warnings": ["<optional warning messages>"]
}"#;

pub fn build_system_prompt() -> String {
    format!(
        "You are a regulatory reporting expert specializing in PRA COREP reporting for UK banks.

Your task is to populate the COREP Own Funds (C 01.00) template based on the regulatory text provided and the user's question.

## Instructions:
1. Analyze the retrieved regulatory text carefully
2. Use SAMPLE/MOCK financial data to populate the COREP fields (this is a prototype)
3. For each field, cite which regulatory chunk IDs you used
4. Explain your reasoning for each value
5. Ensure total_own_funds = common_equity_tier_1 + additional_tier_1 + tier_2

## Output Format:
Return ONLY valid JSON matching this exact schema:
{COREP_SCHEMA}

## Important:
- Use realistic sample values (e.g., CET1: 50000, AT1: 10000, Tier2: 15000)
- Values should be in millions (currency units)
- All values must be >= 0
- Cite specific rule IDs (e.g., PRA_OWNFUNDS_001) in the audit_log
- Provide clear explanations linking rules to values
"
    )
}

pub fn build_user_prompt(question: &str, passages: &[Passage]) -> String {
    let passages_text = passages
        .iter()
        .map(|p| format!("---\n{}\n---", p.to_context_string()))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "## User Question
{question}

## Retrieved Regulatory Text
The following regulatory excerpts are most relevant to the question:

{passages_text}

## Task
Based on the regulatory text above and the user's question:
1. Populate the COREP Own Funds table with appropriate sample values
2. For each field, cite the rule_ids used and explain your reasoning
3. Ensure arithmetic consistency: total_own_funds = CET1 + AT1 + Tier2
4. Return ONLY the JSON output, no other text
"
    )
}
