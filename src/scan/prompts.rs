//! Vision prompts sent to inference backends, one per domain.

use crate::models::ScanType;

const EYES: &str = "Analyze this eye image step-by-step:
1. CHECK LIGHTING: Is the redness just poor lighting or flash reflection? If yes, classify as Healthy.
2. CHECK STRUCTURE: Are the pupils symmetrical? Is the sclera clear? Is the pupil cloudy or hazy?
3. DIFFERENTIATE: Normal blood vessels are Healthy; diffuse pinkness or swelling is Urgent.
4. CLASSIFY:
   - Urgent: conjunctivitis, severe haze or clouding, infection.
   - Concern: dryness, fatigue, mild irritation.
   - Healthy: clear eye.";

const TEETH: &str = "Analyze this dental image step-by-step:
1. CHECK OBJECT: Is this a clear view of teeth and gums? If not, classify as Inconclusive.
2. SHADOW CHECK: Is a dark spot a cavity or a shadow from the open mouth? If uncertain, assume a shadow (Concern).
3. CHECK GUMS: Pink is Healthy; inflamed bright red is Urgent.
4. CLASSIFY:
   - Urgent: obvious deep cavities, abscess, severe gum bleeding.
   - Concern: plaque, tartar, stains, shadows, mild inflammation.
   - Healthy: clean teeth, pink gums.";

const SKIN: &str = "Analyze this skin image step-by-step:
1. CHECK SURFACE: Look for texture irregularities (acne, rash).
2. MOLE ANALYSIS: Apply the ABCD rule (Asymmetry, Border, Color, Diameter). Symmetrical and even moles are Healthy.
3. CLASSIFY:
   - Urgent: bleeding, infection, asymmetrical moles, severe cystic acne.
   - Concern: common acne, dry skin, mild redness.
   - Healthy: clear, even tone.";

const RESPONSE_FORMAT: &str = r#"Act as a professional medical AI assistant.
IMPORTANT: Return ONLY a single valid JSON object with exactly these keys and no surrounding prose, markdown or backticks:
{
  "result": "Healthy" | "Concern" | "Urgent" | "Inconclusive",
  "confidence": integer 0-100 (how certain you are of the result),
  "notes": "Observation summary in two sentences.",
  "recommendations": ["Most urgent action first", "...", "Visual analysis disclaimer"],
  "needsHospital": true | false,
  "severity": "none" | "moderate" | "high"
}"#;

/// Full instruction for analyzing one photo of `scan_type`.
pub fn vision_prompt(scan_type: ScanType) -> String {
    let domain = match scan_type {
        ScanType::Eyes => EYES,
        ScanType::Teeth => TEETH,
        ScanType::Skin => SKIN,
    };
    format!("{domain}\n\n{RESPONSE_FORMAT}")
}
