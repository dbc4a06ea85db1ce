#![no_main]
use libfuzzer_sys::fuzz_target;
use wc2030_gateway::adapters::normalizer::restaurant;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data)
        && let Ok(json) = serde_json::from_str::<serde_json::Value>(text)
    {
        let item = restaurant::normalize(&json, "MAD");
        assert!((0.0..=5.0).contains(&item.summary().rating));
        assert!(item.summary().price.amount > 0.0);
        let _ = restaurant::parse_search("fuzz", &json, "MAD");
    }
});
