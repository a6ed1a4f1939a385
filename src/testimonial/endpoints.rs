use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, post, put};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::manager;
use crate::session::AdminSession;
use crate::sync::SyncContext;
use crate::typedid::RecordId;
use crate::unsaved::UnsavedChanges;
use crate::utils::{ConfirmQuery, ListBody, SuccessBody};

use super::{Testimonial, TestimonialId};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestimonialBody {
    pub quote: String,
    pub author: String,
    pub business: String,
    pub location: String,
    pub logo_url: String,
}

impl CreateTestimonialBody {
    fn into_testimonial(self) -> Testimonial {
        Testimonial {
            id: RecordId::draft(),
            quote: self.quote.trim().to_string(),
            author: self.author.trim().to_string(),
            business: self.business.trim().to_string(),
            location: self.location.trim().to_string(),
            logo_url: self.logo_url.trim().to_string(),
        }
    }
}

#[get("/admin/testimonials")]
#[tracing::instrument(skip(context))]
pub async fn get_testimonials(
    session: AdminSession,
    context: Data<SyncContext>,
) -> Result<Json<ListBody<Testimonial>>, Error> {
    let items = manager::get_all::<Testimonial>(&context).await;

    Ok(Json(ListBody {
        is_loading: context.is_loading(),
        items,
    }))
}

#[post("/admin/testimonials")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn create_testimonial(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    body: Json<CreateTestimonialBody>,
) -> Result<Json<Testimonial>, Error> {
    let testimonial = manager::add(&context, body.into_inner().into_testimonial()).await?;
    unsaved.reset();

    Ok(Json(testimonial))
}

#[put("/admin/testimonials")]
#[tracing::instrument(skip(context, unsaved, body))]
pub async fn replace_testimonials(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    body: Json<Vec<Testimonial>>,
) -> Result<Json<ListBody<Testimonial>>, Error> {
    let items = manager::replace_all(&context, body.into_inner()).await?;
    unsaved.reset();

    Ok(Json(ListBody {
        is_loading: context.is_loading(),
        items,
    }))
}

#[put("/admin/testimonials/{testimonial_id}")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn update_testimonial(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    params: Path<TestimonialId>,
    body: Json<CreateTestimonialBody>,
) -> Result<Json<Testimonial>, Error> {
    let testimonial_id = params.into_inner();

    let testimonial =
        manager::edit(&context, testimonial_id, body.into_inner().into_testimonial()).await?;
    unsaved.reset();

    Ok(Json(testimonial))
}

#[delete("/admin/testimonials/{testimonial_id}")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn delete_testimonial(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    params: Path<TestimonialId>,
    query: Query<ConfirmQuery>,
) -> Result<Json<SuccessBody>, Error> {
    let testimonial_id = params.into_inner();

    manager::remove::<Testimonial>(&context, testimonial_id, query.confirm).await?;
    unsaved.reset();

    Ok(Json(SuccessBody::new()))
}
