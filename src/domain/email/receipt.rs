//! HTML purchase receipt.

use rust_decimal::Decimal;

use crate::domain::catalog::Product;

const DEFAULT_DESCRIPTION: &str = "Plantilla digital profesional";

/// The parts of a product the receipt shows. Accepts any product-shaped JSON.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReceiptProduct {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl From<&Product> for ReceiptProduct {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: Some(product.description.clone()),
            price: product.price,
            download_url: product.download_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    pub brand_name: String,
    pub currency_symbol: String,
}

pub fn receipt_subject(product: &ReceiptProduct) -> String {
    format!("Confirmación de compra - {}", product.title)
}

/// Short transaction reference printed on the receipt.
pub fn transaction_reference(sale_id: &str) -> String {
    sale_id.chars().take(13).collect::<String>().to_uppercase()
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn render_receipt(product: &ReceiptProduct, sale_id: &str, branding: &Branding) -> String {
    let title = escape_html(&product.title);
    let description = escape_html(
        product
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION),
    );
    let total = format!("{} {:.2}", escape_html(&branding.currency_symbol), product.price);
    let reference = escape_html(&transaction_reference(sale_id));
    let brand = escape_html(&branding.brand_name.to_uppercase());

    let download = match product.download_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => {
            let url = escape_html(url);
            format!(
                r#"<div class="download-section">
        <h3>Acceso a su Producto</h3>
        <p>Su producto digital está listo para descargar. Haga clic en el botón a continuación para acceder:</p>
        <a href="{url}" class="download-button">Descargar Producto</a>
        <div class="download-link">{url}</div>
      </div>"#
            )
        }
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
      body {{ font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #1a1a1a; background-color: #f5f5f5; }}
      .email-container {{ max-width: 600px; margin: 0 auto; background-color: #ffffff; }}
      .header {{ background: linear-gradient(135deg, #0891b2 0%, #1e40af 100%); padding: 48px 40px; text-align: center; }}
      .header h1 {{ color: #ffffff; font-size: 26px; margin: 0; }}
      .content {{ padding: 40px; }}
      .order-summary {{ background-color: #fafafa; border: 1px solid #e5e7eb; border-radius: 6px; padding: 28px; margin: 32px 0; }}
      .order-item {{ display: flex; justify-content: space-between; padding: 12px 0; border-bottom: 1px solid #f3f4f6; }}
      .order-label {{ color: #6b7280; font-size: 14px; }}
      .order-value {{ color: #1f2937; font-weight: 600; font-size: 14px; }}
      .download-section {{ background: #eff6ff; border-left: 4px solid #1e40af; padding: 28px; margin: 32px 0; }}
      .download-button {{ display: inline-block; background: #1e40af; color: #ffffff; text-decoration: none; padding: 14px 32px; border-radius: 4px; }}
      .download-link {{ color: #475569; font-size: 12px; word-break: break-all; margin-top: 16px; }}
      .important-note {{ background-color: #fef3c7; border-left: 4px solid #f59e0b; padding: 20px; margin: 32px 0; }}
      .footer {{ background-color: #fafafa; padding: 32px 40px; text-align: center; border-top: 1px solid #e5e7eb; }}
    </style>
  </head>
  <body>
    <div class="email-container">
      <div class="header"><h1>Confirmación de Pedido</h1></div>
      <div class="content">
        <p>Estimado cliente,</p>
        <p>Le confirmamos que su pago ha sido procesado correctamente. A continuación encontrará los detalles de su compra y el acceso a su producto digital.</p>
        <div class="order-summary">
          <h2>Resumen del Pedido</h2>
          <div class="order-item"><span class="order-label">Producto</span><span class="order-value">{title}</span></div>
          <div class="order-item"><span class="order-label">Descripción</span><span class="order-value">{description}</span></div>
          <div class="order-item"><span class="order-label">Total pagado</span><span class="order-value">{total}</span></div>
          <div class="order-item"><span class="order-label">ID de transacción</span><span class="order-value">{reference}</span></div>
        </div>
      {download}
        <div class="important-note">
          <p><strong>Importante:</strong> Conserve este correo para futuras referencias. El enlace de descarga no tiene fecha de caducidad y podrá acceder a su producto en cualquier momento.</p>
        </div>
        <p><strong>¿Necesita asistencia?</strong> Responda a este correo o contacte con nosotros.</p>
      </div>
      <div class="footer">
        <p><strong>{brand}</strong></p>
        <p>Plantillas Digitales Profesionales</p>
        <p>Este es un correo automático generado por el sistema. Por favor, no responda directamente a este mensaje.</p>
      </div>
    </div>
  </body>
</html>
"#
    )
}
