use super::completion::{ChatClient, Sampling};
use super::decode::{DecodeError, decode_json, non_empty, string_list};
use super::routine::RoutineProfile;
use super::{FunctionError, FunctionsState, is_false, json_response};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SAMPLING: Sampling = Sampling {
    temperature: 0.6,
    max_tokens: 300,
};

pub const FALLBACK_COTON_TIP: &str =
    "Hydratez, scellez, protégez : c'est la base d'une chevelure texturée en bonne santé.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Porosity {
    High,
    Low,
    Other,
}

impl Porosity {
    pub fn classify(value: &str) -> Self {
        let value = value.trim().to_lowercase();
        if ["high", "haute", "élevée", "forte"].iter().any(|word| value.contains(word)) {
            Self::High
        } else if ["low", "faible", "basse"].iter().any(|word| value.contains(word)) {
            Self::Low
        } else {
            Self::Other
        }
    }

    fn fallback_routine(self) -> &'static [&'static str] {
        match self {
            Self::High => &[
                "Soin protéiné léger une fois par semaine",
                "Leave-in riche appliqué sur cheveux humides",
                "Sceller avec du beurre de karité",
                "Rinçage final à l'eau froide",
            ],
            Self::Low => &[
                "Chaleur douce pendant les masques pour ouvrir les cuticules",
                "Produits légers à base d'aloe vera",
                "Shampoing clarifiant une fois par mois",
            ],
            Self::Other => &[
                "Brume hydratante à base d'eau chaque matin",
                "Sceller avec une huile légère",
                "Protéger les pointes la nuit",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimePreview {
    pub routine_preview: Vec<String>,
    pub coton_tips: String,
}

impl RealtimePreview {
    pub fn fallback(porosity: &str) -> Self {
        Self {
            routine_preview: Porosity::classify(porosity)
                .fallback_routine()
                .iter()
                .map(|step| step.to_string())
                .collect(),
            coton_tips: FALLBACK_COTON_TIP.to_string(),
        }
    }

    pub fn decode(reply: &str) -> Result<Self, DecodeError> {
        let preview: RealtimePreview = decode_json(reply)?;
        string_list("routinePreview", &preview.routine_preview, 3..=4)?;
        non_empty("cotonTips", &preview.coton_tips)?;
        Ok(preview)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeResponse {
    #[serde(flatten)]
    pub preview: RealtimePreview,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub degraded: bool,
}

/// Always answers 200: the onboarding screen shows this preview live.
pub async fn handler(
    State(state): State<FunctionsState>,
    body: Result<Json<RoutineProfile>, JsonRejection>,
) -> Response {
    let (porosity, result) = match body {
        Ok(Json(profile)) => {
            let result = generate(&state.chat, &profile).await;
            (profile.porosity, result)
        }
        Err(rejection) => (String::new(), Err(FunctionError::from(rejection))),
    };

    let response = match result {
        Ok(preview) => RealtimeResponse {
            preview,
            error: None,
            degraded: false,
        },
        Err(err) => {
            warn!("generate-realtime-tips fell back: {err}");
            RealtimeResponse {
                preview: RealtimePreview::fallback(&porosity),
                error: Some(err.to_string()),
                degraded: true,
            }
        }
    };
    json_response(StatusCode::OK, response)
}

pub async fn generate(
    chat: &ChatClient,
    profile: &RoutineProfile,
) -> Result<RealtimePreview, FunctionError> {
    let system = "Tu es Coton Noir. Réponds uniquement avec un objet JSON {\"routinePreview\": [3 ou 4 \
                  étapes très courtes], \"cotonTips\": \"un conseil en une phrase\"}, sans texte autour.";
    let user = format!(
        "Type : {}\nPorosité : {}\nObjectif : {}\nProblèmes : {}\nBesoins : {}",
        profile.hair_type,
        profile.porosity,
        profile.objective,
        profile.problems.join(", "),
        profile.needs.join(", "),
    );

    let reply = chat.complete(system, &user, SAMPLING).await?;
    let preview = RealtimePreview::decode(&reply)?;
    debug!(steps = preview.routine_preview.len(), "realtime preview generated");
    Ok(preview)
}
