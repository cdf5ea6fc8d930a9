//! Prompt construction for each appraisal step.

use super::types::AppraisalRequest;

/// How many model suggestions to ask for.
pub const SUGGESTION_COUNT: usize = 5;

/// How many variation attributes to ask for.
pub const SPEC_COUNT: usize = 3;

pub fn suggest_models(query: &str) -> String {
    format!(
        "A seller is listing: '{query}'. Return a JSON array of {SUGGESTION_COUNT} specific \
         product/model names (strings) that this most likely refers to, most likely first. \
         Return only the JSON array."
    )
}

pub fn item_specs(item: &str) -> String {
    format!(
        "For the item '{item}', return a JSON object with the {SPEC_COUNT} attributes that most \
         affect its resale price (e.g. Size, Color, Capacity). Each key is the attribute name and \
         each value is an array of option strings. Return only the JSON object."
    )
}

pub fn appraise(request: &AppraisalRequest) -> String {
    let specs = if request.specs().is_empty() {
        "none given".to_string()
    } else {
        serde_json::to_string(request.specs()).unwrap_or_default()
    };
    let condition = request
        .condition()
        .map(|c| c.label())
        .unwrap_or("not stated");
    let verify = if request.photo().is_some() {
        "Check whether the attached photo matches the claimed item and condition; set \
         \"verified\" accordingly and explain in \"note\"."
    } else {
        "No photo was provided: set \"verified\" to false and say so in \"note\"."
    };

    format!(
        "Appraise this item for a second-hand marketplace listing.\n\
         Claimed item: {item}\n\
         Specs: {specs}\n\
         Condition: {condition}\n\
         {verify}\n\
         Return only a JSON object with exactly these keys:\n\
         {{\"verified\": bool, \"note\": string, \"title\": string (catchy listing title), \
         \"description\": string (bullet-point listing description), \
         \"low_price\": string (quick-sale price like \"$40\"), \
         \"high_price\": string (patient-seller price like \"$65\")}}",
        item = request.item()
    )
}

pub fn hype_score(item: &str) -> String {
    format!(
        "On a scale of 1 to 10, how much buyer demand is there right now for '{item}' on \
         second-hand marketplaces? Answer with the number first, then one short sentence."
    )
}

pub fn read_imei() -> String {
    "Read the IMEI number shown in this photo (a settings screen, SIM tray or box label). \
     Answer with the 15 digits only. If no IMEI is visible, answer NONE."
        .to_string()
}
