use axum::{extract::State, response::Html, Json};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_CONTRIBUTION_YEARS, PROJECTION_MONTHS, REPORT_STATUS_DRAFT, REPORT_STATUS_FINAL,
};
use crate::error::{AppError, Result};
use crate::finance::{
    executive_summary, format_months, project_net_worth, render_report_html,
    required_monthly_contribution, Contribution, DashboardSummary, ProjectionInput, ProjectionPoint,
};
use crate::models::MonthlyReport;
use crate::reports;
use crate::routes::auth::AuthSession;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: DashboardSummary,
    pub projection: Vec<ProjectionPoint>,
    /// Time until the projection first reaches the target, if it does
    pub tempo_para_meta: Option<String>,
    pub texto_executivo: String,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyReportRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MonthlyReportResponse {
    pub success: bool,
    pub message: String,
    pub report: MonthlyReport,
}

#[derive(Debug, Deserialize)]
pub struct ContributionRequest {
    /// Years to reach the net worth target
    pub anos: u32,
}

#[derive(Debug, Serialize)]
pub struct ContributionResponse {
    #[serde(flatten)]
    pub contribution: Contribution,
    pub prazo: String,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Summary, projection and executive text computed from fresh data
async fn build_summary(state: &AppState, usuario: &str, today: NaiveDate) -> Result<SummaryResponse> {
    let data = state.sync.load_all(usuario).await?;
    let summary = DashboardSummary::compute(&data, today);

    let projection = project_net_worth(
        ProjectionInput {
            patrimonio_inicial: summary.patrimonio,
            saldo_fixo_mensal: summary.saldo_fixo,
            rendimento_mensal: summary.settings.rendimento_mensal,
            inflacao_mensal: summary.settings.inflacao_mensal,
            meta_patrimonio: summary.settings.meta_patrimonio,
            meses: PROJECTION_MONTHS,
        },
        today,
    );
    let tempo_para_meta = projection
        .iter()
        .position(|p| p.meta_atingida)
        .map(|months| format_months(months as u32));
    let texto_executivo = executive_summary(&summary, &projection);

    Ok(SummaryResponse {
        summary,
        projection,
        tempo_para_meta,
        texto_executivo,
    })
}

/// Dashboard headline numbers for the session user
///
/// GET /api/summary
pub async fn dashboard_summary(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<SummaryResponse>> {
    Ok(Json(build_summary(&state, &session.usuario, today()).await?))
}

/// Save the current month's executive report
///
/// POST /api/reports/monthly
///
/// Answers 409 when the month was already finalized.
pub async fn save_monthly_report(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(payload): Json<MonthlyReportRequest>,
) -> Result<Json<MonthlyReportResponse>> {
    let status = payload
        .status
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| REPORT_STATUS_DRAFT.to_string());
    if status != REPORT_STATUS_DRAFT && status != REPORT_STATUS_FINAL {
        return Err(AppError::InvalidInput(format!("Invalid report status: {}", status)));
    }

    let today = today();
    let built = build_summary(&state, &session.usuario, today).await?;
    let report = MonthlyReport {
        mes: built.summary.mes.clone(),
        patrimonio: built.summary.patrimonio,
        saldo_fixo: built.summary.saldo_fixo,
        saldo_variavel: built.summary.saldo_variavel,
        perc_meta: built.summary.perc_meta,
        texto_executivo: built.texto_executivo,
        status,
    };

    reports::save_monthly_report(&state.sync, &session.usuario, &report).await?;

    Ok(Json(MonthlyReportResponse {
        success: true,
        message: format!("Relatório salvo como {}.", report.status),
        report,
    }))
}

/// Printable executive report for the current month
///
/// GET /api/reports/monthly/html
pub async fn monthly_report_html(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Html<String>> {
    let today = today();
    let built = build_summary(&state, &session.usuario, today).await?;
    Ok(Html(render_report_html(&built.summary, &built.texto_executivo, today)))
}

/// Monthly saving needed to reach the configured target in `anos` years
///
/// POST /api/projections/contribution
pub async fn contribution_plan(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(payload): Json<ContributionRequest>,
) -> Result<Json<ContributionResponse>> {
    if payload.anos == 0 || payload.anos > MAX_CONTRIBUTION_YEARS {
        return Err(AppError::InvalidInput(format!(
            "anos must be between 1 and {}",
            MAX_CONTRIBUTION_YEARS
        )));
    }

    let data = state.sync.load_all(&session.usuario).await?;
    let summary = DashboardSummary::compute(&data, today());
    let contribution = required_monthly_contribution(
        summary.patrimonio,
        summary.settings.meta_patrimonio,
        summary.settings.rendimento_mensal,
        summary.settings.inflacao_mensal,
        payload.anos,
    );

    Ok(Json(ContributionResponse {
        contribution,
        prazo: format_months(payload.anos.saturating_mul(12)),
    }))
}
