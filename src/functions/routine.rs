use super::completion::{ChatClient, Sampling};
use super::decode::{DecodeError, decode_json, non_empty, string_list};
use super::{FunctionError, FunctionsState, is_false, json_response};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const SAMPLING: Sampling = Sampling {
    temperature: 0.7,
    max_tokens: 600,
};

pub const DEFAULT_STEPS: [&str; 5] = [
    "Pré-poo à l'huile végétale sur les longueurs et les pointes",
    "Shampoing doux sans sulfates concentré sur le cuir chevelu",
    "Masque hydratant sous chaleur douce pendant 20 minutes",
    "Leave-in puis huile et crème (méthode LOC) pour sceller l'hydratation",
    "Coiffure protectrice et bonnet en satin pour la nuit",
];
pub const DEFAULT_PRIORITY_STEPS: [usize; 2] = [2, 3];
pub const DEFAULT_TIP: &str =
    "La régularité compte plus que la quantité de produits : tenez votre routine chaque semaine.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutineProfile {
    pub hair_type: String,
    pub porosity: String,
    pub objective: String,
    pub problems: Vec<String>,
    pub needs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineRequest {
    pub profile: RoutineProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutinePlan {
    pub steps: Vec<String>,
    pub priority_steps: Vec<usize>,
    pub tip: String,
}

impl RoutinePlan {
    pub fn default_routine() -> Self {
        Self {
            steps: DEFAULT_STEPS.iter().map(|step| step.to_string()).collect(),
            priority_steps: DEFAULT_PRIORITY_STEPS.to_vec(),
            tip: DEFAULT_TIP.to_string(),
        }
    }

    /// Decodes a completion reply into a plan with 4 to 6 steps and in-range
    /// priority indices.
    pub fn decode(reply: &str) -> Result<Self, DecodeError> {
        let mut plan: RoutinePlan = decode_json(reply)?;
        string_list("steps", &plan.steps, 4..=6)?;
        non_empty("tip", &plan.tip)?;
        if let Some(&index) = plan.priority_steps.iter().find(|&&index| index >= plan.steps.len()) {
            return Err(DecodeError::PriorityOutOfRange {
                index,
                len: plan.steps.len(),
            });
        }
        plan.priority_steps.sort_unstable();
        plan.priority_steps.dedup();
        Ok(plan)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineResponse {
    #[serde(flatten)]
    pub plan: RoutinePlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub degraded: bool,
}

impl RoutineResponse {
    fn fallback(error: &FunctionError) -> Self {
        Self {
            plan: RoutinePlan::default_routine(),
            error: Some(error.to_string()),
            degraded: true,
        }
    }
}

pub async fn handler(
    State(state): State<FunctionsState>,
    body: Result<Json<RoutineRequest>, JsonRejection>,
) -> Response {
    let result = match body {
        Ok(Json(request)) => generate(&state.chat, &request.profile).await,
        Err(rejection) => Err(FunctionError::from(rejection)),
    };

    match result {
        Ok(plan) => json_response(
            StatusCode::OK,
            RoutineResponse {
                plan,
                error: None,
                degraded: false,
            },
        ),
        // The model answered but not with a usable plan.
        Err(err @ FunctionError::Decode(_)) => {
            warn!("generate-personalized-routine used the default routine: {err}");
            json_response(StatusCode::OK, RoutineResponse::fallback(&err))
        }
        Err(err) => {
            warn!("generate-personalized-routine fell back: {err}");
            json_response(
                state.fallback_status_code(StatusCode::INTERNAL_SERVER_ERROR),
                RoutineResponse::fallback(&err),
            )
        }
    }
}

pub async fn generate(
    chat: &ChatClient,
    profile: &RoutineProfile,
) -> Result<RoutinePlan, FunctionError> {
    let system = "Tu es Coton Noir, experte des cheveux texturés. Tu réponds uniquement avec un objet JSON \
                  de la forme {\"steps\": [4 à 6 étapes courtes], \"prioritySteps\": [indices des étapes \
                  prioritaires dans steps], \"tip\": \"un conseil personnalisé\"}, sans texte autour.";
    let user = format!(
        "Crée une routine de soin personnalisée pour ce profil :\n- Type : {}\n- Porosité : {}\n- Objectif : {}\n- Problèmes : {}\n- Besoins : {}",
        profile.hair_type,
        profile.porosity,
        profile.objective,
        profile.problems.join(", "),
        profile.needs.join(", "),
    );

    let reply = chat.complete(system, &user, SAMPLING).await?;
    let plan = RoutinePlan::decode(&reply)?;
    info!(steps = plan.steps.len(), "personalized routine generated");
    Ok(plan)
}
