use super::completion::{ChatClient, Sampling};
use super::decode::non_empty;
use super::{FunctionError, FunctionsState, is_false, json_response};
use crate::models::DetailedHairProfile;
use crate::tips::TipType;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const GENERIC_FALLBACK_TIP: &str = "Hydratez vos cheveux régulièrement et protégez vos pointes la nuit avec un bonnet ou une taie en satin.";

const SAMPLING: Sampling = Sampling {
    temperature: 0.8,
    max_tokens: 300,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HairTipRequest {
    #[serde(default)]
    pub hair_profile: DetailedHairProfile,
    pub tip_type: TipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HairTipResponse {
    pub tip: String,
    pub tip_type: TipType,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub degraded: bool,
}

impl HairTipResponse {
    pub fn fallback(tip_type: TipType, error: &FunctionError) -> Self {
        Self {
            tip: GENERIC_FALLBACK_TIP.to_string(),
            tip_type,
            timestamp: Utc::now(),
            error: Some(error.to_string()),
            degraded: true,
        }
    }
}

pub async fn handler(
    State(state): State<FunctionsState>,
    body: Result<Json<HairTipRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = FunctionError::from(rejection);
            warn!("generate-hair-tips: {err}");
            return json_response(
                state.fallback_status_code(StatusCode::INTERNAL_SERVER_ERROR),
                HairTipResponse::fallback(TipType::General, &err),
            );
        }
    };

    match generate(&state.chat, &request).await {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => {
            warn!(tip_type = %request.tip_type, "generate-hair-tips fell back: {err}");
            json_response(
                state.fallback_status_code(StatusCode::INTERNAL_SERVER_ERROR),
                HairTipResponse::fallback(request.tip_type, &err),
            )
        }
    }
}

pub async fn generate(
    chat: &ChatClient,
    request: &HairTipRequest,
) -> Result<HairTipResponse, FunctionError> {
    let system = system_prompt(&request.hair_profile);
    let user = user_prompt(request.tip_type, request.context.as_deref());

    let reply = chat.complete(&system, &user, SAMPLING).await?;
    let tip = reply.trim().trim_matches('"').trim().to_string();
    non_empty("tip", &tip)?;

    info!(tip_type = %request.tip_type, "hair tip generated");
    Ok(HairTipResponse {
        tip,
        tip_type: request.tip_type,
        timestamp: Utc::now(),
        error: None,
        degraded: false,
    })
}

fn system_prompt(profile: &DetailedHairProfile) -> String {
    let mut prompt = String::from(
        "Tu es Coton Noir, une experte bienveillante des cheveux crépus, frisés et bouclés. \
         Tu donnes des conseils concrets, courts (3 phrases maximum) et sans jargon.",
    );

    let field = |value: &str| {
        if value.trim().is_empty() {
            "non précisé".to_string()
        } else {
            value.trim().to_string()
        }
    };
    let list = |values: &[String]| {
        if values.is_empty() {
            "aucun".to_string()
        } else {
            values.join(", ")
        }
    };

    prompt.push_str(&format!(
        "\n\nProfil capillaire :\n- Type : {}\n- Porosité : {}\n- Objectif : {}\n- Problèmes : {}\n- Besoins : {}",
        field(&profile.hair_type),
        field(&profile.porosity),
        field(&profile.objective),
        list(&profile.problems),
        list(&profile.needs),
    ));
    prompt
}

fn user_prompt(tip_type: TipType, context: Option<&str>) -> String {
    let request = match tip_type {
        TipType::Routine => "Donne-moi un conseil pour améliorer ma routine de soin hebdomadaire.",
        TipType::General => "Donne-moi le conseil du jour pour prendre soin de mes cheveux.",
        TipType::Product => {
            "Conseille-moi un type de produit ou d'ingrédient adapté à mes cheveux, sans citer de marque."
        }
        TipType::Seasonal => "Donne-moi un conseil adapté à la saison actuelle pour mes cheveux.",
        TipType::Styling => "Propose-moi une coiffure ou une technique de coiffage adaptée à mes cheveux.",
    };

    match context.map(str::trim).filter(|context| !context.is_empty()) {
        Some(context) => format!("{request}\nContexte : {context}"),
        None => request.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_appends_context() {
        let prompt = user_prompt(TipType::Seasonal, Some("  il fait très froid "));
        assert!(prompt.ends_with("Contexte : il fait très froid"));
        assert!(!user_prompt(TipType::General, Some("   ")).contains("Contexte"));
    }

    #[test]
    fn system_prompt_describes_profile() {
        let profile = DetailedHairProfile {
            hair_type: "4C".to_string(),
            porosity: "high".to_string(),
            problems: vec!["casse".to_string(), "sécheresse".to_string()],
            ..DetailedHairProfile::default()
        };
        let prompt = system_prompt(&profile);
        assert!(prompt.contains("Type : 4C"));
        assert!(prompt.contains("Problèmes : casse, sécheresse"));
        assert!(prompt.contains("Objectif : non précisé"));
    }

    #[test]
    fn fallback_is_marked_degraded() {
        let err = FunctionError::InvalidRequest("missing field".to_string());
        let response = HairTipResponse::fallback(TipType::Product, &err);
        assert_eq!(response.tip, GENERIC_FALLBACK_TIP);
        assert!(response.degraded);
        assert!(response.error.unwrap().contains("missing field"));
    }
}
