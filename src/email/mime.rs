use lettre::message::{
    Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart,
    header::{ContentType, HeaderName, HeaderValue},
};

use crate::email::{Attachment, EmailBody, EmailError, EmailMessage};

/// Renders a message as RFC 5322 bytes, for transports that take raw MIME.
///
/// Bcc recipients are left out of the headers; the transport delivers to them
/// from its own envelope.
pub fn build_raw_message(
    message: &EmailMessage,
    attachments: &[Attachment],
) -> Result<Vec<u8>, EmailError> {
    let mut builder = lettre::Message::builder()
        .from(parse_mailbox(&message.from)?)
        .subject(message.subject.as_str());

    for to in &message.to {
        builder = builder.to(parse_mailbox(to)?);
    }
    for cc in &message.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }
    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(parse_mailbox(reply_to)?);
    }

    for (name, value) in &message.headers {
        let header_name = HeaderName::new_from_ascii(name.clone())
            .map_err(|_| EmailError::InvalidHeader(name.clone()))?;
        builder = builder.raw_header(HeaderValue::new(header_name, value.clone()));
    }

    let built = if attachments.is_empty() {
        match &message.body {
            EmailBody::Text(text) => builder.singlepart(SinglePart::plain(text.clone())),
            EmailBody::Html(html) => builder.singlepart(SinglePart::html(html.clone())),
            EmailBody::Both { text, html } => builder.multipart(
                MultiPart::alternative_plain_html(text.clone(), html.clone()),
            ),
        }
    } else {
        let mut mixed = match &message.body {
            EmailBody::Text(text) => MultiPart::mixed().singlepart(SinglePart::plain(text.clone())),
            EmailBody::Html(html) => MultiPart::mixed().singlepart(SinglePart::html(html.clone())),
            EmailBody::Both { text, html } => MultiPart::mixed().multipart(
                MultiPart::alternative_plain_html(text.clone(), html.clone()),
            ),
        };

        for attachment in attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|_| EmailError::InvalidAttachment(attachment.filename.clone()))?;
            mixed = mixed.singlepart(
                MimeAttachment::new(attachment.filename.clone())
                    .body(attachment.data.clone(), content_type),
            );
        }

        builder.multipart(mixed)
    };

    let built = built.map_err(|e| EmailError::ProviderError(e.to_string()))?;
    Ok(built.formatted())
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse::<Mailbox>()
        .map_err(|_| EmailError::InvalidEmail(address.to_string()))
}
