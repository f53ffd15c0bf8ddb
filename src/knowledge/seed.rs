//! Built-in starter dataset for new deployments

use crate::models::KnowledgeEntryData;

/// Starter knowledge entries covering common cut flowers. Loaded by
/// `KnowledgeManager::seed_knowledge_base` when the store is empty.
pub fn starter_entries() -> Vec<KnowledgeEntryData> {
    vec![
        KnowledgeEntryData {
            flower_type: "Rose".to_string(),
            variety: Some("Red Naomi".to_string()),
            care_requirements: "Roses require clean water, floral food, and regular stem \
                recutting. Remove thorns and leaves below the water line."
                .to_string(),
            optimal_temperature: "33-35°F (1-2°C)".to_string(),
            optimal_humidity: "85-90%".to_string(),
            water_requirements: "Clean, room temperature water with floral food. Change water \
                every 2-3 days."
                .to_string(),
            ethylene_sensitivity: "High - keep away from ripening fruits".to_string(),
            common_issues: "Bent neck, petal bruising, bacterial growth in water".to_string(),
            vase_life_tips: "Recut stems at 45-degree angle, remove lower leaves, use \
                anti-ethylene treatment"
                .to_string(),
            source_name: "Florists Review".to_string(),
            source_url: "https://www.floristsreview.com/rose-care-guide".to_string(),
        },
        KnowledgeEntryData {
            flower_type: "Tulip".to_string(),
            variety: Some("Standard".to_string()),
            care_requirements: "Tulips continue growing after cutting. Use cold water and avoid \
                direct sunlight."
                .to_string(),
            optimal_temperature: "32-35°F (0-2°C)".to_string(),
            optimal_humidity: "80-85%".to_string(),
            water_requirements: "Cold water, minimal floral food. Tulips prefer less food than \
                other flowers."
                .to_string(),
            ethylene_sensitivity: "Low".to_string(),
            common_issues: "Excessive stem growth, drooping heads, color fading".to_string(),
            vase_life_tips: "Use cold water, avoid warm environments, minimal handling"
                .to_string(),
            source_name: "Flower Council".to_string(),
            source_url: "https://www.flowercouncil.org/tulip-care".to_string(),
        },
        KnowledgeEntryData {
            flower_type: "Lily".to_string(),
            variety: Some("Oriental".to_string()),
            care_requirements: "Remove pollen to prevent staining. Lilies are sensitive to \
                ethylene and require clean water."
                .to_string(),
            optimal_temperature: "33-35°F (1-2°C)".to_string(),
            optimal_humidity: "85-90%".to_string(),
            water_requirements: "Clean water with floral food. Remove pollen carefully."
                .to_string(),
            ethylene_sensitivity: "High - keep away from ripening fruits".to_string(),
            common_issues: "Pollen staining, petal drop, stem rot".to_string(),
            vase_life_tips: "Remove pollen carefully, use anti-ethylene treatment, avoid \
                touching petals"
                .to_string(),
            source_name: "Lily Care Guide".to_string(),
            source_url: "https://www.lilycareguide.com".to_string(),
        },
        KnowledgeEntryData {
            flower_type: "Carnation".to_string(),
            variety: Some("Standard".to_string()),
            care_requirements: "Carnations are ethylene sensitive and require clean water. They \
                can last 2-3 weeks with proper care."
                .to_string(),
            optimal_temperature: "33-35°F (1-2°C)".to_string(),
            optimal_humidity: "80-85%".to_string(),
            water_requirements: "Clean water with floral food. Carnations are heavy drinkers."
                .to_string(),
            ethylene_sensitivity: "High - keep away from ripening fruits".to_string(),
            common_issues: "Wilting, color fading, stem breakage".to_string(),
            vase_life_tips: "Use anti-ethylene treatment, recut stems regularly, avoid warm \
                temperatures"
                .to_string(),
            source_name: "Carnation Care".to_string(),
            source_url: "https://www.carnationcare.com".to_string(),
        },
        KnowledgeEntryData {
            flower_type: "Gerbera".to_string(),
            variety: Some("Daisy".to_string()),
            care_requirements: "Gerberas are sensitive to bacteria and require very clean water. \
                Avoid getting water on the flower head."
                .to_string(),
            optimal_temperature: "33-35°F (1-2°C)".to_string(),
            optimal_humidity: "80-85%".to_string(),
            water_requirements: "Very clean water with floral food. Change water daily."
                .to_string(),
            ethylene_sensitivity: "Medium".to_string(),
            common_issues: "Bent stems, bacterial growth, petal wilting".to_string(),
            vase_life_tips: "Use clean containers, avoid water on flower head, recut stems daily"
                .to_string(),
            source_name: "Gerbera Care Association".to_string(),
            source_url: "https://www.gerberacare.org".to_string(),
        },
    ]
}
