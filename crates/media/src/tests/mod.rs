//! Szenarien der Medien-Pipeline gegen simulierte Plattform-Medien

mod pipeline_scenarios;
