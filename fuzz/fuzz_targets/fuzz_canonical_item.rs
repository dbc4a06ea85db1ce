#![no_main]
use libfuzzer_sys::fuzz_target;
use wc2030_gateway::adapters::normalizer;
use wc2030_gateway::domain::inventory::Domain;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data)
        && let Ok(json) = serde_json::from_str::<serde_json::Value>(text)
    {
        for domain in Domain::ALL {
            if let Ok(item) = normalizer::canonical(domain, &json) {
                assert_eq!(item.domain(), domain);
                assert!(!item.summary().images.is_empty());
            }
        }
    }
});
