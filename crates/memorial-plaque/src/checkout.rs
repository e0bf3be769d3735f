//! Turning a finished draft into a stored order.

use tracing::{debug, info};

use crate::catalog::try_price_of;
use crate::error::{Error, Result};
use crate::qr::{MemorialQr, Palette, QrGenerator};
use crate::storage::{CheckoutRecord, NewMemorialPage, NewOrder, NewPlaque, OrderStatus, Storage};
use crate::wizard::{missing_fields, OrderDraft, Shape, Step};

/// Upper bound on numbered slug suffixes tried before giving up.
const MAX_SLUG_SUFFIX: u32 = 1000;

/// Place an order for `quantity` plaques described by `draft`.
///
/// The memorial page gets the draft's slug, or the first free `-2`, `-3`,
/// ... variant of it. `qr` is reused when it already encodes the page's
/// URL; otherwise a code is generated for the reserved slug. The page, its
/// QR record and the order are written together with status
/// [`OrderStatus::PendingPayment`].
///
/// # Errors
///
/// Returns [`Error::IncompleteDraft`] if the draft is missing fields from
/// the first two wizard steps, [`Error::InvalidValue`] for a zero quantity
/// or a name with no usable slug, and propagates pricing, QR and storage
/// errors.
pub async fn place_order(
    storage: &Storage,
    generator: &QrGenerator,
    draft: &OrderDraft,
    qr: Option<&MemorialQr>,
    quantity: u32,
    currency: &str,
) -> Result<CheckoutRecord> {
    let missing: Vec<&'static str> = [Step::MaterialAndDesign, Step::MemorialDetails]
        .into_iter()
        .flat_map(|step| missing_fields(draft, step))
        .collect();
    if !missing.is_empty() {
        return Err(Error::IncompleteDraft { missing });
    }
    if quantity == 0 {
        return Err(Error::invalid_value("quantity", "0"));
    }

    let (Some(material), Some(size), Some(qr_color), Some(text_color), Some(full_name)) = (
        draft.material(),
        draft.size(),
        draft.qr_color(),
        draft.text_color(),
        draft.full_name(),
    ) else {
        return Err(Error::internal("complete draft has unset fields"));
    };

    let total_amount = try_price_of(material.as_str(), size.as_str(), quantity)?;
    let base_slug = draft
        .slug()
        .ok_or_else(|| Error::invalid_value("full_name", full_name))?;
    let slug = reserve_slug(storage, &base_slug)?;

    let url = generator.memorial_url(&slug);
    let qr = match qr {
        Some(qr) if qr.slug == slug && qr.url == url => {
            debug!(%slug, "Reusing wizard QR code");
            qr.clone()
        }
        _ => {
            generator
                .generate_for_slug(&slug, Palette::for_engraving(qr_color))
                .await?
        }
    };

    let page = NewMemorialPage {
        slug,
        full_name: full_name.to_string(),
        nick_name: draft.nick_name().map(str::to_string),
        birth_month_year: draft.birth_month_year().map(str::to_string),
        death_month_year: draft.death_month_year().map(str::to_string),
        few_words: draft.few_words().map(str::to_string),
        about_text: None,
        privacy: draft.privacy(),
    };
    let order = NewOrder {
        status: OrderStatus::PendingPayment,
        total_amount,
        currency: currency.to_string(),
        payment_intent_id: None,
        plaques: vec![NewPlaque {
            memorial_page_id: None,
            material,
            size,
            shape: draft.shape().unwrap_or(Shape::Square),
            qr_color,
            text_color,
            text_lines: draft.text_lines(),
            font_choice: draft.font_choice().map(str::to_string),
            quantity,
        }],
    };

    let record = storage.record_checkout(&page, &qr, &order)?;
    info!(
        order_number = %record.order.order_number,
        total = %record.order.total_amount,
        "Placed order"
    );
    Ok(record)
}

/// First slug among `base`, `base-2`, `base-3`, ... with no memorial page.
fn reserve_slug(storage: &Storage, base: &str) -> Result<String> {
    if !storage.slug_exists(base)? {
        return Ok(base.to_string());
    }
    for n in 2..=MAX_SLUG_SUFFIX {
        let candidate = format!("{base}-{n}");
        if !storage.slug_exists(&candidate)? {
            debug!(%base, %candidate, "Slug taken, using suffixed variant");
            return Ok(candidate);
        }
    }
    Err(Error::SlugTaken(base.to_string()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::{MaterialType, SizeId};
    use crate::wizard::{DraftPatch, PlaqueColor};

    const ORIGIN: &str = "https://plaques.example";

    fn complete_draft(name: &str) -> OrderDraft {
        OrderDraft::new().patched(&DraftPatch {
            material: Some(MaterialType::Brass),
            size: Some(SizeId::QrName),
            qr_color: Some(PlaqueColor::Black),
            text_color: Some(PlaqueColor::Gold),
            full_name: Some(name.to_string()),
            few_words: Some("Forever in our hearts".to_string()),
            ..DraftPatch::default()
        })
    }

    #[tokio::test]
    async fn test_incomplete_draft_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let generator = QrGenerator::new(ORIGIN);
        let draft = OrderDraft::new().patched(&DraftPatch {
            material: Some(MaterialType::Steel),
            full_name: Some("Ada".to_string()),
            ..DraftPatch::default()
        });

        let err = place_order(&storage, &generator, &draft, None, 1, "USD")
            .await
            .unwrap_err();
        match err {
            Error::IncompleteDraft { missing } => {
                assert_eq!(missing, vec!["size", "qr_color", "text_color", "few_words"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(storage.stats().unwrap().total_orders, 0);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let generator = QrGenerator::new(ORIGIN);

        let err = place_order(&storage, &generator, &complete_draft("Ada"), None, 0, "USD")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { field: "quantity", .. }));
    }

    #[tokio::test]
    async fn test_places_pending_order() {
        let storage = Storage::open_in_memory().unwrap();
        let generator = QrGenerator::new(ORIGIN);

        let record = place_order(
            &storage,
            &generator,
            &complete_draft("Ada Lovelace"),
            None,
            2,
            "USD",
        )
        .await
        .unwrap();

        assert_eq!(record.order.status, OrderStatus::PendingPayment);
        assert_eq!(record.order.total_amount, "199.98".parse::<Decimal>().unwrap());
        assert_eq!(record.order.currency, "USD");
        assert_eq!(record.memorial_page.slug, "ada-lovelace");
        assert_eq!(record.memorial_page.qr_records.len(), 1);
        assert_eq!(
            record.memorial_page.qr_records[0].qr_value,
            "https://plaques.example/memorial/ada-lovelace"
        );

        let plaque = &record.order.plaques[0];
        assert_eq!(plaque.shape, Shape::Square);
        assert_eq!(plaque.quantity, 2);
        assert_eq!(plaque.text_lines, vec!["Ada Lovelace", "Forever in our hearts"]);
        assert_eq!(plaque.memorial_page_id, Some(record.memorial_page.id));
    }

    #[tokio::test]
    async fn test_slug_collision_gets_suffix_and_fresh_qr() {
        let storage = Storage::open_in_memory().unwrap();
        let generator = QrGenerator::new(ORIGIN);
        let draft = complete_draft("Ada Lovelace");

        let first = place_order(&storage, &generator, &draft, None, 1, "USD")
            .await
            .unwrap();
        let wizard_qr = generator
            .generate_for_slug("ada-lovelace", Palette::for_engraving(PlaqueColor::Black))
            .await
            .unwrap();
        let second = place_order(&storage, &generator, &draft, Some(&wizard_qr), 1, "USD")
            .await
            .unwrap();
        let third = place_order(&storage, &generator, &draft, None, 1, "USD")
            .await
            .unwrap();

        assert_eq!(first.memorial_page.slug, "ada-lovelace");
        assert_eq!(second.memorial_page.slug, "ada-lovelace-2");
        assert_eq!(third.memorial_page.slug, "ada-lovelace-3");
        assert_eq!(
            second.memorial_page.qr_records[0].qr_value,
            "https://plaques.example/memorial/ada-lovelace-2"
        );
    }

    #[tokio::test]
    async fn test_matching_wizard_qr_is_reused() {
        let storage = Storage::open_in_memory().unwrap();
        let generator = QrGenerator::new(ORIGIN);
        let qr = generator
            .generate_for_slug("grace-hopper", Palette::for_engraving(PlaqueColor::Black))
            .await
            .unwrap();

        let record = place_order(
            &storage,
            &generator,
            &complete_draft("Grace Hopper"),
            Some(&qr),
            1,
            "EUR",
        )
        .await
        .unwrap();

        assert_eq!(record.memorial_page.qr_records[0].svg, qr.image.svg);
        assert_eq!(record.order.currency, "EUR");
    }

    #[tokio::test]
    async fn test_unsluggable_name_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let generator = QrGenerator::new(ORIGIN);

        let err = place_order(&storage, &generator, &complete_draft("!!!"), None, 1, "USD")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { field: "full_name", .. }));
    }
}
