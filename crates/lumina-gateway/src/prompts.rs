//! Prompt assembly for every gateway capability.

use lumina_schema::Concept;

/// Number of concepts requested per generation. Callers must still accept any count.
pub const CONCEPT_COUNT: usize = 3;

pub const CONCEPT_SYSTEM_INSTRUCTION: &str =
    "You are an expert design consultant for elite brand agencies. Output strictly JSON.";

pub fn concept_prompt(business_name: &str, industry: &str, style: &str) -> String {
    format!(
        r#"You are a world-class brand identity designer.
Create {CONCEPT_COUNT} distinct, professional, and creative logo design concepts for a business.

Business Name: "{business_name}"
Industry/Theme: "{industry}"
Preferred Style: "{style}"

Guidelines:
- Focus heavily on the requested style: "{style}".
- STRICTLY AVOID generic stock imagery.
- Focus on unique geometric abstractions, clever negative space, or custom illustrative styles.
- Explicitly describe the focal point and the usage of negative space.
- Provide a detailed color palette for each concept including specific HEX codes.

For each concept, provide:
1. A creative Name.
2. A detailed visual prompt description.
3. The rationale/meaning.
4. A detailed color palette (Primary, Secondary, Accent) with HEX codes in #RRGGBB form."#
    )
}

pub fn refine_prompt(concept: &Concept, feedback: &str) -> String {
    let original = serde_json::to_string_pretty(concept).unwrap_or_else(|_| format!("{concept:?}"));
    format!(
        r#"You are an expert design consultant iteratively refining a logo concept.

Original Concept:
{original}

User Feedback:
"{feedback}"

Task:
- Revise the concept based strictly on the user feedback.
- Return the complete revised concept, every field included."#
    )
}

pub fn image_prompt(visual_description: &str) -> String {
    format!(
        "Professional high-end minimalist logo design, vector graphics style, clean lines, \
         flat design, solid white background. Focal elements: {visual_description}. \
         NO realistic photo details, NO complex shading, NO text."
    )
}

pub fn edit_prompt(instruction: &str) -> String {
    format!(
        "Edit this logo design based on: \"{instruction}\"\n\
         Maintain the existing professional style: clean vector logo, solid white background, \
         flat colors, no text."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_schema::{ColorSwatch, SwatchRole};

    #[test]
    fn concept_prompt_carries_inputs_and_count() {
        let prompt = concept_prompt("Acme", "Coffee", "Modern & Minimalist");
        assert!(prompt.contains("Create 3 distinct"));
        assert!(prompt.contains(r#"Business Name: "Acme""#));
        assert!(prompt.contains(r#"Industry/Theme: "Coffee""#));
        assert_eq!(prompt.matches("Modern & Minimalist").count(), 2);
    }

    #[test]
    fn refine_prompt_embeds_full_concept() {
        let concept = Concept {
            name: "Orbit".into(),
            visual_description: "Ring".into(),
            rationale: "Reach".into(),
            palette: vec![ColorSwatch::new(SwatchRole::Primary, "Ink", "#111111")],
        };
        let prompt = refine_prompt(&concept, "make it bolder");
        assert!(prompt.contains(r#""conceptName": "Orbit""#));
        assert!(prompt.contains(r##""hex": "#111111""##));
        assert!(prompt.contains(r#""make it bolder""#));
    }

    #[test]
    fn image_prompts_wrap_style_constraints() {
        let prompt = image_prompt("a folded paper crane");
        assert!(prompt.contains("Focal elements: a folded paper crane."));
        assert!(prompt.contains("solid white background"));
        assert!(prompt.contains("NO text"));

        let edit = edit_prompt("add a blue shadow");
        assert!(edit.contains(r#""add a blue shadow""#));
        assert!(edit.contains("flat colors, no text"));
    }
}
