//! Rule-based predictions and static English/Swahili text tables.
//!
//! Used whenever an artifact is missing or fails, and as the only source of
//! Swahili text.

use shared::{DevelopmentalRisk, Language, MalnutritionStatus};

use super::{FeatureVector, NutritionModels, Prediction};

/// Capability bundle that never touches a trained model
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackModels;

impl NutritionModels for FallbackModels {
    fn predict(&self, features: &FeatureVector) -> Prediction {
        predict(features)
    }

    fn recommend(&self, status: MalnutritionStatus, risk: DevelopmentalRisk, language: Language) -> String {
        recommendation(status, risk, language).to_string()
    }

    fn answer(&self, question: &str, language: Language) -> String {
        chatbot_answer(question, language).to_string()
    }
}

/// Z-score and BMI thresholds. Severe is checked first so that it is not
/// shadowed by the Stunting and Underweight cut-offs.
pub fn predict(features: &FeatureVector) -> Prediction {
    let weight_z = features.weight_for_age_zscore;
    let height_z = features.height_for_age_zscore;

    let status = if weight_z < -3.0 || height_z < -3.0 {
        MalnutritionStatus::Severe
    } else if height_z < -2.0 {
        MalnutritionStatus::Stunting
    } else if weight_z < -2.0 {
        MalnutritionStatus::Underweight
    } else if features.bmi > 25.0 {
        MalnutritionStatus::Overweight
    } else {
        MalnutritionStatus::Normal
    };

    Prediction {
        malnutrition_status: status,
        developmental_risk: DevelopmentalRisk::derived_from(status),
    }
}

pub fn recommendation(status: MalnutritionStatus, risk: DevelopmentalRisk, language: Language) -> &'static str {
    let (english, swahili) = recommendation_texts(status, risk).unwrap_or(GENERIC_RECOMMENDATION);
    language.pick(english, swahili)
}

const GENERIC_RECOMMENDATION: (&str, &str) = (
    "Based on your child's nutritional status, please provide balanced meals with proteins, fruits, and vegetables. \
     Visit your local clinic for proper assessment and personalized guidance on your child's nutrition and growth.",
    "Kulingana na hali ya lishe ya mtoto wako, tafadhali mpe milo kamili yenye protini, matunda na mboga. \
     Tembelea kliniki iliyo karibu kwa tathmini na ushauri maalum kuhusu lishe na ukuaji wa mtoto wako.",
);

fn recommendation_texts(status: MalnutritionStatus, risk: DevelopmentalRisk) -> Option<(&'static str, &'static str)> {
    use DevelopmentalRisk::*;
    use MalnutritionStatus::*;

    let texts = match (status, risk) {
        (Normal, NoRisk) => (
            "Your child is growing well! Continue providing balanced meals with fruits, vegetables, grains, and proteins. \
             Keep regular meal times and ensure adequate physical activity. Visit the clinic for routine check-ups to maintain healthy growth.",
            "Mtoto wako anakua vizuri! Endelea kumpa milo kamili yenye matunda, mboga, nafaka na protini. \
             Dumisha nyakati za kawaida za kula na hakikisha anapata mazoezi ya kutosha. Tembelea kliniki kwa uchunguzi wa kawaida ili kudumisha ukuaji mzuri.",
        ),
        (Normal, AtRisk) => (
            "Your child's measurements are in the normal range, but some signs need attention. Keep providing balanced meals with fruits, vegetables, grains, and proteins. \
             Watch for recent infections and poor appetite. Visit the clinic for a check-up to confirm your child's development is on track.",
            "Vipimo vya mtoto wako viko katika kiwango cha kawaida, lakini kuna dalili zinazohitaji uangalizi. Endelea kumpa milo kamili yenye matunda, mboga, nafaka na protini. \
             Angalia maambukizi ya hivi karibuni na kukosa hamu ya kula. Tembelea kliniki kwa uchunguzi ili kuhakikisha maendeleo ya mtoto wako yako sawa.",
        ),
        (Stunting, AtRisk) => (
            "Your child shows signs of stunting which affects height growth. Provide protein-rich foods like beans, groundnuts, eggs, milk, and fish. \
             Include iron-rich foods and fruits for vitamins. Please visit the clinic immediately for growth monitoring and nutritional counseling.",
            "Mtoto wako ana dalili za kudumaa ambazo zinaathiri ukuaji wa urefu. Mpe vyakula vyenye protini kama maharagwe, karanga, mayai, maziwa na samaki. \
             Ongeza vyakula vyenye madini ya chuma na matunda kwa vitamini. Tafadhali tembelea kliniki mara moja kwa ufuatiliaji wa ukuaji na ushauri wa lishe.",
        ),
        (Stunting, HighRisk) => (
            "Your child has severe stunting requiring urgent attention. Increase protein intake with beans, meat, eggs, and milk daily. \
             Add nutrient-dense foods and consider therapeutic feeding programs. Visit the clinic urgently for specialized care and monitoring.",
            "Mtoto wako ana udumavu mkubwa unaohitaji uangalizi wa haraka. Ongeza protini kila siku kwa maharagwe, nyama, mayai na maziwa. \
             Ongeza vyakula vyenye virutubisho vingi na fikiria programu za lishe tiba. Tembelea kliniki haraka kwa huduma maalum na ufuatiliaji.",
        ),
        (Underweight, AtRisk) => (
            "Your child is underweight and needs more nutritious food. Add calorie-dense foods like groundnuts, avocados, and cooking oil to meals. \
             Provide frequent small meals with proteins and healthy fats. Please visit the clinic for growth assessment and feeding guidance.",
            "Mtoto wako ana uzito pungufu na anahitaji chakula chenye lishe zaidi. Ongeza vyakula vyenye nishati nyingi kama karanga, parachichi na mafuta ya kupikia kwenye milo. \
             Mpe milo midogo mara kwa mara yenye protini na mafuta yenye afya. Tafadhali tembelea kliniki kwa tathmini ya ukuaji na ushauri wa ulishaji.",
        ),
        (Underweight, HighRisk) => (
            "Your child is severely underweight and needs immediate intervention. Increase meal frequency and add high-energy foods daily. \
             Include therapeutic foods if available and ensure treatment for any infections. Visit the health facility urgently for specialized care.",
            "Mtoto wako ana uzito pungufu sana na anahitaji msaada wa haraka. Ongeza idadi ya milo na vyakula vyenye nishati nyingi kila siku. \
             Tumia vyakula tiba vikipatikana na hakikisha magonjwa yoyote yanatibiwa. Tembelea kituo cha afya haraka kwa huduma maalum.",
        ),
        (Overweight, AtRisk) => (
            "Your child is overweight which can affect healthy development. Reduce sugary foods and increase fruits and vegetables. \
             Encourage active play and limit sedentary time. Visit the clinic for proper assessment and guidance on healthy eating habits.",
            "Mtoto wako ana uzito uliozidi ambao unaweza kuathiri ukuaji wenye afya. Punguza vyakula vyenye sukari na ongeza matunda na mboga. \
             Himiza michezo ya kutumia nguvu na punguza muda wa kukaa bila shughuli. Tembelea kliniki kwa tathmini na ushauri kuhusu ulaji bora.",
        ),
        (Overweight, HighRisk) => (
            "Your child has significant overweight requiring careful management. Focus on nutritious, balanced meals without excess sugars or fats. \
             Increase physical activity through play and sports. Please visit the clinic for comprehensive evaluation and weight management plan.",
            "Mtoto wako ana uzito uliozidi kwa kiasi kikubwa unaohitaji usimamizi makini. Zingatia milo kamili yenye lishe bila sukari au mafuta mengi. \
             Ongeza mazoezi kupitia michezo. Tafadhali tembelea kliniki kwa uchunguzi kamili na mpango wa kudhibiti uzito.",
        ),
        (Severe, HighRisk) => (
            "Your child has severe malnutrition requiring immediate medical attention. This is a serious condition that needs urgent treatment. \
             Visit the hospital or clinic immediately for emergency care. Follow all medical advice and therapeutic feeding protocols strictly.",
            "Mtoto wako ana utapiamlo mkali unaohitaji matibabu ya haraka. Hii ni hali hatari inayohitaji matibabu ya dharura. \
             Nenda hospitali au kliniki mara moja kwa huduma ya dharura. Fuata ushauri wote wa kitabibu na taratibu za lishe tiba kikamilifu.",
        ),
        _ => return None,
    };
    Some(texts)
}

struct ChatbotTopic {
    keywords: &'static [&'static str],
    english: &'static str,
    swahili: &'static str,
}

// Checked in order; the first topic with a keyword in the question wins.
const CHATBOT_TOPICS: [ChatbotTopic; 3] = [
    ChatbotTopic {
        keywords: &["feed", "food", "eat", "nutrition", "chakula", "vyakula", "lishe", "kulisha", "nyonyesha"],
        english: "For healthy growth, feed your child a variety of foods including fruits, vegetables, grains, proteins like beans or eggs, and dairy products. \
                  Ensure meals are regular and age-appropriate. Breastfeeding is important for babies under 2 years. \
                  Consult your healthcare provider for specific dietary guidance.",
        swahili: "Kwa ukuaji wenye afya, mlishe mtoto wako vyakula mbalimbali ikiwemo matunda, mboga, nafaka, protini kama maharagwe au mayai, na bidhaa za maziwa. \
                  Hakikisha milo ni ya mara kwa mara na inafaa umri wake. Kunyonyesha ni muhimu kwa watoto chini ya miaka 2. \
                  Wasiliana na mhudumu wa afya kwa ushauri maalum wa lishe.",
    },
    ChatbotTopic {
        keywords: &["growth", "develop", "milestone", "ukuaji", "kukua", "maendeleo", "hatua"],
        english: "Each child develops at their own pace, but regular check-ups are important. \
                  Ensure good nutrition, adequate sleep, and engage in age-appropriate play activities. \
                  Monitor key milestones and consult your healthcare provider if you have concerns about your child's development.",
        swahili: "Kila mtoto hukua kwa kasi yake, lakini uchunguzi wa mara kwa mara ni muhimu. \
                  Hakikisha lishe bora, usingizi wa kutosha na michezo inayofaa umri wake. \
                  Fuatilia hatua muhimu za ukuaji na wasiliana na mhudumu wa afya ukiwa na wasiwasi kuhusu maendeleo ya mtoto wako.",
    },
    ChatbotTopic {
        keywords: &["weight", "height", "size", "uzito", "urefu", "ukubwa", "kimo"],
        english: "Regular growth monitoring is essential for children. Maintain growth charts and visit your healthcare provider regularly. \
                  Focus on balanced nutrition, physical activity appropriate for the child's age, and adequate rest. \
                  Contact your healthcare provider if growth patterns seem concerning.",
        swahili: "Ufuatiliaji wa ukuaji wa mara kwa mara ni muhimu kwa watoto. Tunza chati za ukuaji na tembelea mhudumu wa afya mara kwa mara. \
                  Zingatia lishe kamili, mazoezi yanayofaa umri wa mtoto na mapumziko ya kutosha. \
                  Wasiliana na mhudumu wa afya ikiwa mwenendo wa ukuaji unatia wasiwasi.",
    },
];

const GENERAL_ANSWER: (&str, &str) = (
    "For the best care of your child, ensure proper nutrition with diverse foods, regular medical check-ups, and age-appropriate activities. \
     Each child is unique, so consult with your healthcare provider for personalized advice about your child's health and development. \
     Maintain vaccination schedules and seek professional help when needed.",
    "Kwa malezi bora ya mtoto wako, hakikisha lishe bora yenye vyakula mbalimbali, uchunguzi wa afya wa mara kwa mara na shughuli zinazofaa umri wake. \
     Kila mtoto ni wa kipekee, hivyo wasiliana na mhudumu wa afya kwa ushauri maalum kuhusu afya na maendeleo ya mtoto wako. \
     Fuata ratiba ya chanjo na tafuta msaada wa kitaalamu inapohitajika.",
);

pub fn chatbot_answer(question: &str, language: Language) -> &'static str {
    let question = question.to_lowercase();

    let (english, swahili) = CHATBOT_TOPICS
        .iter()
        .find(|topic| topic.keywords.iter().any(|k| question.contains(k)))
        .map(|topic| (topic.english, topic.swahili))
        .unwrap_or(GENERAL_ANSWER);

    language.pick(english, swahili)
}
