use creature_core::{Pipeline, PipelineConfig, SummaryIndex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

fn create_test_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn row(item: &str, chance: u32, min: u32, max: u32) -> String {
    format!(
        r#""{0}": {{"Item": {{"AssetPathName": "/Game/Items/{0}.{0}"}}, "Chance": {1}, "MinQuantity": {2}, "MaxQuantity": {3}}}"#,
        item, chance, min, max
    )
}

fn create_test_table(root: &Path, tier: u32, name: &str, rows: &[String]) {
    create_test_file(
        &root.join(format!("Tier{}", tier)).join(format!("{}.json", name)),
        &format!(
            r#"[{{"Type": "DataTable", "Name": "{}", "Rows": {{{}}}}}]"#,
            name,
            rows.join(",")
        ),
    );
}

/// A small game: two creatures with templates, one without, one pointing
/// at a template that does not exist, and one broken file.
fn create_test_world(root: &Path) -> PipelineConfig {
    let config = PipelineConfig {
        data_tables_dir: root.join("LootTables"),
        templates_dir: root.join("templates"),
        creatures_dir: root.join("creatures"),
        output_dir: root.join("out"),
        ..PipelineConfig::default()
    };

    let tables = &config.data_tables_dir;
    create_test_table(tables, 1, "Scraps_T1", &[row("Stone", 60, 1, 2), row("Stick", 20, 1, 1)]);
    create_test_table(tables, 1, "Pebbles_T1", &[row("Stone", 50, 2, 5)]);
    create_test_table(tables, 3, "Ores_T3", &[row("Gold", 50, 1, 2)]);
    create_test_table(tables, 3, "Scraps_T3", &[row("Stone", 40, 2, 4)]);

    create_test_file(
        &config.templates_dir.join("EasyRupu_T1.json"),
        r#"{
            "name": "EasyRupu_T1",
            "type": "EasyRupu_T1_C",
            "class": "BlueprintGeneratedClass",
            "tables": [
                {"name": "Scraps_T1"},
                {"name": "Pebbles_T1"},
                {"objectPath": "Mist/Data/LootTables/Tier3/Ores_T3.0"}
            ]
        }"#,
    );
    create_test_file(
        &config.templates_dir.join("hard/HardRupu_T3_C.json"),
        r#"[
            {"Type": "BlueprintGeneratedClass", "Name": "HardRupu_T3_C",
             "Super": {"ObjectName": "BlueprintGeneratedClass'BaseRupu_C'"}},
            {"Type": "HardRupu_T3_C", "Name": "Default__HardRupu_T3_C", "Class": "UScriptClass'HardRupu_T3_C'",
             "Properties": {"Loot": {"Tables": [
                {"Table": {"ObjectName": "DataTable'Ores_T3'"}, "MaxIterations": 2},
                {"Table": {"ObjectName": "DataTable'Scraps_T3'"},
                 "MinQuantityMultiplier": 1.5, "MaxQuantityMultiplier": 2.0}
             ]}}}
        ]"#,
    );

    let creatures = &config.creatures_dir;
    create_test_file(
        &creatures.join("rupu.json"),
        r#"{"basicInfo": {"name": "Rupu", "type": "Rupu_T1"}, "lootTemplate": "EasyRupu_T1", "health": 50}"#,
    );
    create_test_file(
        &creatures.join("hard_rupu.json"),
        r#"{"basicInfo": {"name": "Hard Rupu", "type": "Rupu_T3"}, "lootTemplate": "HardRupu_T3"}"#,
    );
    create_test_file(
        &creatures.join("moth.json"),
        r#"{"basicInfo": {"name": "Moth", "type": "Moth"}, "wings": 4}"#,
    );
    create_test_file(
        &creatures.join("ghost.json"),
        r#"{"basicInfo": {"name": "Ghost", "type": "Ghost_T2"}, "lootTemplate": "Haunted_T2"}"#,
    );
    create_test_file(&creatures.join("zz_broken.json"), "{\"basicInfo\": ");

    config
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn item<'a>(creature: &'a Value, name: &str) -> Option<&'a Value> {
    creature["loot"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == name)
}

fn snapshot(dir: &Path) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    for entry in std::fs::read_dir(dir).unwrap().flatten() {
        let path = entry.path();
        if path.is_dir() {
            for (name, content) in snapshot(&path) {
                files.insert(format!("{}/{}", entry.file_name().to_string_lossy(), name), content);
            }
        } else {
            files.insert(
                entry.file_name().to_string_lossy().into_owned(),
                std::fs::read_to_string(&path).unwrap(),
            );
        }
    }
    files
}

#[test]
fn test_run_report() {
    let dir = TempDir::new().unwrap();
    let config = create_test_world(dir.path());

    let report = Pipeline::new(config.clone()).run().unwrap();

    assert_eq!(report.templates_loaded, 2);
    assert_eq!(report.creatures_processed, 4);
    assert_eq!(report.creatures_enriched, 2);
    // Scraps_T1, Pebbles_T1, Ores_T3, Scraps_T3
    assert_eq!(report.tables_loaded, 4);
    assert_eq!(report.disk_reads, 4);
    assert_eq!(report.failures, vec![config.creatures_dir.join("zz_broken.json")]);
}

#[test]
fn test_tier_filtering() {
    let dir = TempDir::new().unwrap();
    let config = create_test_world(dir.path());
    Pipeline::new(config.clone()).run().unwrap();

    let rupu = read_json(&config.enriched_dir().join("rupu.json"));
    assert!(item(&rupu, "Gold").is_none());
    let tables: Vec<&str> = rupu["loot"]["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tableName"].as_str().unwrap())
        .collect();
    assert_eq!(tables, vec!["Scraps_T1", "Pebbles_T1"]);

    let hard = read_json(&config.enriched_dir().join("hard_rupu.json"));
    let gold = item(&hard, "Gold").unwrap();
    assert_eq!(gold["effectiveChance"], "75.0000");
    assert_eq!(hard["loot"]["tables"][0]["tier"], "T3");
}

#[test]
fn test_aggregated_drops() {
    let dir = TempDir::new().unwrap();
    let config = create_test_world(dir.path());
    Pipeline::new(config.clone()).run().unwrap();

    let rupu = read_json(&config.enriched_dir().join("rupu.json"));
    let items = rupu["loot"]["items"].as_array().unwrap();
    assert_eq!(items[0]["name"], "Stone");
    assert_eq!(items[0]["effectiveChance"], "80.0000");
    assert_eq!(items[0]["quantity"]["min"], 1);
    assert_eq!(items[0]["quantity"]["max"], 5);
    assert_eq!(items[1]["name"], "Stick");
    assert_eq!(rupu["health"], 50);

    let hard = read_json(&config.enriched_dir().join("hard_rupu.json"));
    let stone = item(&hard, "Stone").unwrap();
    assert_eq!(stone["quantity"]["min"], 3);
    assert_eq!(stone["quantity"]["max"], 8);
}

#[test]
fn test_creatures_without_loot_unchanged() {
    let dir = TempDir::new().unwrap();
    let config = create_test_world(dir.path());
    Pipeline::new(config.clone()).run().unwrap();

    let moth = read_json(&config.enriched_dir().join("moth.json"));
    assert!(moth.get("loot").is_none());
    assert_eq!(moth["wings"], 4);

    let ghost = read_json(&config.enriched_dir().join("ghost.json"));
    assert!(ghost.get("loot").is_none());
    assert!(!config.enriched_dir().join("zz_broken.json").exists());
}

#[test]
fn test_summary_report() {
    let dir = TempDir::new().unwrap();
    let config = create_test_world(dir.path());
    Pipeline::new(config.clone()).run().unwrap();

    let summary: SummaryIndex =
        serde_json::from_str(&std::fs::read_to_string(config.summary_path()).unwrap()).unwrap();

    assert_eq!(summary.total_creatures, 4);
    assert_eq!(summary.creatures_by_type["Rupu"], 2);
    assert_eq!(summary.creatures_by_type["Moth"], 1);
    assert_eq!(summary.creatures_by_type["Ghost"], 1);

    let stone = &summary.item_drops["Stone"];
    let sources: Vec<(&str, f64)> = stone
        .dropped_by
        .iter()
        .map(|s| (s.creature.as_str(), s.chance))
        .collect();
    assert_eq!(sources, vec![("Rupu", 80.0), ("Hard Rupu", 40.0)]);
    assert_eq!(stone.highest_chance, 80.0);
    assert_eq!(stone.lowest_chance, 40.0);
}

#[test]
fn test_contents_listing() {
    let dir = TempDir::new().unwrap();
    let config = create_test_world(dir.path());
    Pipeline::new(config.clone()).run().unwrap();

    let contents = read_json(&config.contents_path());
    assert_eq!(contents[0]["name"], "EasyRupu_T1");
    assert_eq!(contents[0]["tables"][2]["tableName"], "Ores_T3");
    assert_eq!(contents[0]["tables"][2]["tier"], "3");
    assert_eq!(contents[1]["name"], "HardRupu_T3_C");
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let config = create_test_world(dir.path());

    Pipeline::new(config.clone()).run().unwrap();
    let first = snapshot(&config.output_dir);

    Pipeline::new(config.clone()).run().unwrap();
    assert_eq!(snapshot(&config.output_dir), first);
}

#[test]
fn test_reuse_contents_skips_table_reads() {
    let dir = TempDir::new().unwrap();
    let config = create_test_world(dir.path());

    Pipeline::new(config.clone()).run().unwrap();
    let first = snapshot(&config.output_dir);

    let reuse = PipelineConfig {
        reuse_contents: true,
        ..config.clone()
    };
    let report = Pipeline::new(reuse).run().unwrap();
    assert_eq!(report.disk_reads, 0);
    assert_eq!(report.tables_loaded, 4);
    assert_eq!(snapshot(&config.output_dir), first);
}
