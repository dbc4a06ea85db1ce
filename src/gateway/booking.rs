use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use lru::LruCache;
use rand::Rng;
use tracing::{info, warn};

use crate::domain::booking::{BookingConfirmation, BookingRequest};
use crate::domain::envelope::Envelope;
use crate::gateway::cache::CacheOrchestrator;
use crate::ports::provider::ProviderStrategy;

const SUFFIX_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 4;
/// Numbers kept for collision checks. Older numbers carry an earlier
/// millisecond stamp and cannot be drawn again.
const RECENT_NUMBERS: NonZeroUsize = NonZeroUsize::new(4096).unwrap();

/// Uppercase base-36 rendering of a non-negative integer.
fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let d = u8::try_from(n % 36).unwrap_or(0);
        digits.push(SUFFIX_CHARS[usize::from(if d < 10 { d + 26 } else { d - 10 })]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Mints customer-facing confirmation numbers: `<prefix>-<base36 ms><4 random>`.
///
/// Recently issued numbers are remembered and a colliding draw is redrawn.
/// Requests carry no idempotency key, so identical bookings get distinct
/// numbers.
pub struct ConfirmationMinter {
    prefix: String,
    issued: Mutex<LruCache<String, ()>>,
}

impl ConfirmationMinter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_memory(prefix, RECENT_NUMBERS)
    }

    fn with_memory(prefix: impl Into<String>, capacity: NonZeroUsize) -> Self {
        Self {
            prefix: prefix.into(),
            issued: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn mint(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
            let suffix: String = (0..SUFFIX_LEN)
                .map(|_| char::from(SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())]))
                .collect();
            let number = format!("{}-{}{suffix}", self.prefix, base36(millis));
            if !issued.contains(&number) {
                issued.put(number.clone(), ());
                return number;
            }
            warn!(%number, "Confirmation number collision, redrawing");
        }
    }
}

/// Validate, book, mint, invalidate. Booking failures reach the caller
/// unchanged; nothing here substitutes synthetic data.
pub struct BookingPipeline {
    minter: ConfirmationMinter,
}

impl BookingPipeline {
    pub fn new(confirmation_prefix: impl Into<String>) -> Self {
        Self {
            minter: ConfirmationMinter::new(confirmation_prefix),
        }
    }

    pub async fn run(
        &self,
        strategy: &dyn ProviderStrategy,
        cache: &CacheOrchestrator,
        request: &BookingRequest,
    ) -> Envelope<BookingConfirmation> {
        let domain = strategy.domain();
        let service = strategy.service();

        if let Err(e) = request.validate(domain) {
            info!(%domain, error = %e, "Booking rejected before submission");
            return Envelope::err(e.to_api_error(service));
        }

        match strategy.book(request).await {
            Ok(mut confirmation) => {
                confirmation.confirmation_number = self.minter.mint();
                cache.invalidate_domain(domain);
                info!(
                    %domain,
                    booking_id = %confirmation.booking_id,
                    confirmation = %confirmation.confirmation_number,
                    status = %confirmation.status,
                    "Booking confirmed"
                );
                Envelope::created(confirmation)
            }
            Err(e) => {
                let error = e.into_booking_failure(service).to_api_error(service);
                warn!(%domain, service = %error.service, status = error.status, message = %error.message, "Booking failed");
                Envelope::err(error)
            }
        }
    }
}
