//! Instructions sent alongside each request.

use persona_types::Role;
use serde_json::{json, Value};

/// Instruction paired with the uploaded photo for the avatar edit.
pub fn transform_instruction(role: &Role) -> String {
    format!(
        "Transform the person in this photo into a {role}. Keep their face and \
         expression recognizable, and restyle clothing, hair, props, background \
         and lighting so the portrait clearly reads as a {role}. Return only the \
         edited image."
    )
}

/// System instruction that keeps chat turns in character.
pub fn system_instruction(role: &Role) -> String {
    format!(
        "You are a {role}. Stay fully in character as a {role} for the whole \
         conversation and never mention that you are an AI model. Detect the \
         language the user writes in and reply in that same language. Keep each \
         reply under 80 words so it can be spoken aloud. Respond with JSON where \
         \"language\" is the BCP-47 tag of your reply (for example \"en-US\" or \
         \"hi-IN\") and \"response\" is the reply text."
    )
}

/// Schema forcing the `{language, response}` reply shape.
pub fn reply_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "language": {
                "type": "STRING",
                "description": "BCP-47 language tag of the response, e.g. en-US"
            },
            "response": {
                "type": "STRING",
                "description": "The in-character reply"
            }
        },
        "required": ["language", "response"],
        "propertyOrdering": ["language", "response"]
    })
}

/// Strips a surrounding Markdown code fence, if the model added one.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}
