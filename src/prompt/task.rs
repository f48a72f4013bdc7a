use std::fmt;

use serde::{Deserialize, Serialize};

/// The clinical analyses requested for every submitted history.
///
/// Variant order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum TaskLabel {
    ClinicalProblemRepresentation,
    MostLikelyDiagnosis,
    ExpandedDifferentialDiagnosis,
    AlternativeDiagnosis,
    ClinicalAssessment,
    ClinicalTreatmentPlan,
    MonitoringAndFollowUp,
}

impl TaskLabel {
    /// Every task, in display order.
    pub const ALL: [TaskLabel; 7] = [
        TaskLabel::ClinicalProblemRepresentation,
        TaskLabel::MostLikelyDiagnosis,
        TaskLabel::ExpandedDifferentialDiagnosis,
        TaskLabel::AlternativeDiagnosis,
        TaskLabel::ClinicalAssessment,
        TaskLabel::ClinicalTreatmentPlan,
        TaskLabel::MonitoringAndFollowUp,
    ];

    /// Stable machine-readable name.
    pub fn key(self) -> &'static str {
        match self {
            Self::ClinicalProblemRepresentation => "clinical_problem_representation",
            Self::MostLikelyDiagnosis => "most_likely_diagnosis",
            Self::ExpandedDifferentialDiagnosis => "expanded_differential_diagnosis",
            Self::AlternativeDiagnosis => "alternative_diagnosis",
            Self::ClinicalAssessment => "clinical_assessment",
            Self::ClinicalTreatmentPlan => "clinical_treatment_plan",
            Self::MonitoringAndFollowUp => "monitoring_and_follow_up",
        }
    }

    /// Section heading shown to the clinician.
    pub fn title(self) -> &'static str {
        match self {
            Self::ClinicalProblemRepresentation => "Clinical Problem Representation",
            Self::MostLikelyDiagnosis => "Most Likely Diagnosis",
            Self::ExpandedDifferentialDiagnosis => "Expanded Differential Diagnosis",
            Self::AlternativeDiagnosis => "Alternative Diagnosis",
            Self::ClinicalAssessment => "Clinical Assessment",
            Self::ClinicalTreatmentPlan => "Clinical Treatment Plan",
            Self::MonitoringAndFollowUp => "Monitoring and Follow-Up",
        }
    }

    /// What the model is asked to do with the history.
    pub fn instructions(self) -> &'static str {
        match self {
            Self::ClinicalProblemRepresentation => PROBLEM_REPRESENTATION,
            Self::MostLikelyDiagnosis => MOST_LIKELY_DIAGNOSIS,
            Self::ExpandedDifferentialDiagnosis => EXPANDED_DIFFERENTIAL,
            Self::AlternativeDiagnosis => ALTERNATIVE_DIAGNOSIS,
            Self::ClinicalAssessment => CLINICAL_ASSESSMENT,
            Self::ClinicalTreatmentPlan => TREATMENT_PLAN,
            Self::MonitoringAndFollowUp => MONITORING_AND_FOLLOW_UP,
        }
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

const PROBLEM_REPRESENTATION: &'static str = "\
Provide a concise summary of the key clinical issues, findings, \
and diagnostic challenges presented in the case. \
Ensure the response integrates the patient's history, symptoms, \
physical examination, and test results.\
";

const MOST_LIKELY_DIAGNOSIS: &'static str = "\
Provide your primary most likely diagnostic hypothesis, \
supported by a detailed explanation that integrates the patient's history, \
symptoms, physical examination, and test results. \
Include any relevant pathophysiological mechanisms, epidemiological factors, \
or diagnostic criteria that support your diagnosis.\
";

const EXPANDED_DIFFERENTIAL: &'static str = "\
Provide a comprehensive list of differential diagnoses that should be considered, \
along with brief explanations for their inclusion in the differential. \
Evaluate the relative likelihood of each differential diagnosis \
based on the available information.\
";

const ALTERNATIVE_DIAGNOSIS: &'static str = "\
Provide a comprehensive list of alternative diagnoses that should be considered, \
along with brief explanations for their inclusion as alternatives. \
Evaluate the relative likelihood of each alternative diagnosis \
based on the available information.\
";

const CLINICAL_ASSESSMENT: &'static str = "\
List specific diagnostic tests, procedures, or imaging studies that you recommend \
to confirm or rule out the suspected diagnosis, \
as well as any additional tests needed to evaluate the differential diagnoses \
or address any remaining diagnostic uncertainties.\
";

const TREATMENT_PLAN: &'static str = "\
You are a highly experienced clinician. \
Based on the detailed patient case provided above, \
create an elaborate clinical treatment plan that addresses the patient's condition comprehensively. \
Your response should include the most likely diagnosis, \
a thorough analysis of the patient's symptoms, \
a step-by-step treatment plan, \
and any necessary follow-up actions. \
Ensure the response is detailed and at least 400 words.\
";

const MONITORING_AND_FOLLOW_UP: &'static str = "\
Provide comprehensive guidelines for monitoring the patient's response to treatment, \
potential complications or adverse effects to watch for, \
and recommended follow-up plans, \
including any necessary specialist referrals or additional testing.\
";
