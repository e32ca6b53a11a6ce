//! Response assembly: the single place a successful `ForecastResult` is built.

use glucocast_core::forecast::{
    EventContext, ForecastMetadata, ForecastResult, ForecastStatus, SuspiciousJump, TrendAnalysis,
};
use glucocast_core::series::{HORIZON_MINUTES, STEP_MINUTES};

pub const CONSTRAINTS_NOTE: &str = "Predictions include physiological constraints";

/// Everything the pipeline computed for one request.
#[derive(Debug, Clone)]
pub struct PipelineOutput<'a> {
    pub original: Vec<f64>,
    pub adjusted: Vec<f64>,
    pub last_known: f64,
    pub input_length: usize,
    pub analysis: TrendAnalysis,
    pub model: &'a str,
    pub context: Option<&'a EventContext>,
    pub jumps: Vec<SuspiciousJump>,
}

#[derive(Debug, Clone, Copy)]
pub struct AssemblyOptions {
    pub include_analysis: bool,
    pub round_output: bool,
}

pub fn assemble(output: PipelineOutput<'_>, options: AssemblyOptions) -> ForecastResult {
    let finish = |values: Vec<f64>| -> Vec<f64> {
        if options.round_output {
            values.into_iter().map(round_reading).collect()
        } else {
            values
        }
    };
    let last_known = if options.round_output {
        round_reading(output.last_known)
    } else {
        output.last_known
    };

    let mut notes = vec![
        format!("Current trend: {}", output.analysis.trend),
        format!("Variability: {:.1} mg/dL", output.analysis.variability),
        CONSTRAINTS_NOTE.to_string(),
    ];
    if let Some(ctx) = output.context.filter(|c| c.is_active()) {
        notes.push(format!(
            "Prediction adjusted for upcoming events: {}",
            ctx.describe()
        ));
    }

    let metadata = ForecastMetadata {
        prediction_horizon_minutes: HORIZON_MINUTES,
        time_step_minutes: STEP_MINUTES,
        model_confidence: output.analysis.confidence,
        model: output.model.to_string(),
        notes,
        warnings: output.jumps,
    };

    ForecastResult {
        status: ForecastStatus::Success,
        original_prediction: finish(output.original),
        adjusted_prediction: Some(finish(output.adjusted)),
        last_known_glucose: Some(last_known),
        input_length: Some(output.input_length),
        analysis: options.include_analysis.then_some(output.analysis),
        metadata: Some(metadata),
        error_message: None,
        error_kind: None,
    }
}

/// Whole mg/dL, ties to even. Monotone, so bounds and step limits survive.
pub fn round_reading(value: f64) -> f64 {
    value.round_ties_even()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glucocast_core::forecast::Trend;

    fn output(context: Option<&EventContext>) -> PipelineOutput<'_> {
        PipelineOutput {
            original: vec![124.4, 126.5, 127.5],
            adjusted: vec![124.4, 126.5, 129.6],
            last_known: 122.0,
            input_length: 12,
            analysis: TrendAnalysis {
                slope: 2.0,
                trend: Trend::Rising,
                confidence: 76.2,
                variability: 6.9,
                r_squared: 1.0,
                range: 22.0,
            },
            model: "drift",
            context,
            jumps: Vec::new(),
        }
    }

    const ROUNDED: AssemblyOptions = AssemblyOptions {
        include_analysis: false,
        round_output: true,
    };

    #[test]
    fn rounds_predictions_ties_to_even() {
        let result = assemble(output(None), ROUNDED);
        assert!(result.is_success());
        assert_eq!(result.original_prediction, vec![124.0, 126.0, 128.0]);
        assert_eq!(result.adjusted_prediction, Some(vec![124.0, 126.0, 130.0]));
        assert_eq!(result.last_known_glucose, Some(122.0));
        assert!(result.analysis.is_none());
    }

    #[test]
    fn metadata_carries_constants_and_notes() {
        let result = assemble(output(None), ROUNDED);
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.prediction_horizon_minutes, 60);
        assert_eq!(metadata.time_step_minutes, 5);
        assert_eq!(metadata.model_confidence, 76.2);
        assert_eq!(metadata.model, "drift");
        assert_eq!(
            metadata.notes,
            vec![
                "Current trend: rising".to_string(),
                "Variability: 6.9 mg/dL".to_string(),
                CONSTRAINTS_NOTE.to_string(),
            ]
        );
    }

    #[test]
    fn active_context_is_echoed() {
        let ctx = EventContext::new().with_carbs(60.0);
        let result = assemble(output(Some(&ctx)), ROUNDED);
        let notes = result.metadata.unwrap().notes;
        assert_eq!(
            notes.last().unwrap(),
            "Prediction adjusted for upcoming events: 60g carbs"
        );
    }

    #[test]
    fn analysis_and_raw_values_on_request() {
        let result = assemble(
            output(None),
            AssemblyOptions {
                include_analysis: true,
                round_output: false,
            },
        );
        assert_eq!(result.original_prediction, vec![124.4, 126.5, 127.5]);
        assert_eq!(result.analysis.unwrap().trend, Trend::Rising);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(assemble(output(None), ROUNDED)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["lastKnownGlucose"], 122.0);
        assert_eq!(json["inputLength"], 12);
        assert_eq!(json["metadata"]["predictionHorizonMinutes"], 60);
        assert!(json.get("errorMessage").is_none());
        assert!(json["metadata"].get("warnings").is_none());
    }
}
