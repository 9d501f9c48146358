use futures::future::try_join_all;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Layout;
use crate::models::{self, COORDINATOR_LAST_COLUMN, Coordinator, MATCH_LAST_COLUMN, Match, Student, Teacher};
use crate::store::{CellAddress, RowRange, RowStore, StoreError};

#[derive(Error, Debug)]
pub enum DataError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unknown city '{0}'")]
    UnknownCity(String),
}

/// Every record in the spreadsheet at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub teachers: Vec<Teacher>,
    pub coordinators: Vec<Coordinator>,
    pub matches: Vec<Match>,
}

impl Snapshot {
    pub fn coordinator_by_email(&self, email: &str) -> Option<&Coordinator> {
        self.coordinators
            .iter()
            .find(|c| c.email.eq_ignore_ascii_case(email))
    }

    pub fn teacher(&self, index: usize) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.index == index)
    }

    pub fn student(&self, city: &str, index: usize) -> Option<&Student> {
        self.students
            .iter()
            .find(|s| s.city == city && s.index == index)
    }
}

/// Reads all sheets concurrently and maps them into records.
pub async fn load_snapshot(store: &dyn RowStore, layout: &Layout) -> Result<Snapshot, DataError> {
    let sheets = &layout.sheets;
    let links = layout.links();
    let student_last_column = links.student_last_column();

    let student_reads = sheets.students.iter().map(|entry| async move {
        let rows = store
            .get_rows(&RowRange::records(&entry.sheet, student_last_column))
            .await?;
        Ok::<_, StoreError>(models::parse_students(&rows, &entry.city, &links))
    });

    let teachers_range = RowRange::records(&sheets.teachers, links.teacher_last_column());
    let coordinators_range = RowRange::records(&sheets.coordinators, COORDINATOR_LAST_COLUMN);
    let matches_range = RowRange::records(&sheets.matches, MATCH_LAST_COLUMN);

    let result = tokio::try_join!(
        try_join_all(student_reads),
        store.get_rows(&teachers_range),
        store.get_rows(&coordinators_range),
        store.get_rows(&matches_range),
    );

    let (students, teacher_rows, coordinator_rows, match_rows) = result.map_err(|e| {
        error!("Failed to load spreadsheet data: {e}");
        e
    })?;

    let snapshot = Snapshot {
        students: students.into_iter().flatten().collect(),
        teachers: models::parse_teachers(&teacher_rows, &links),
        coordinators: models::parse_coordinators(&coordinator_rows),
        matches: models::parse_matches(&match_rows),
    };

    info!(
        "Loaded {} students, {} teachers, {} coordinators, {} matches",
        snapshot.students.len(),
        snapshot.teachers.len(),
        snapshot.coordinators.len(),
        snapshot.matches.len()
    );
    Ok(snapshot)
}

pub fn teacher_assignment_cell(layout: &Layout, teacher_index: usize) -> CellAddress {
    CellAddress::for_record(
        &layout.sheets.teachers,
        layout.teacher_matched_student,
        teacher_index,
    )
}

pub fn student_assignment_cell(
    layout: &Layout,
    student_index: usize,
    city: &str,
) -> Result<CellAddress, DataError> {
    let sheet = layout
        .student_sheet(city)
        .ok_or_else(|| DataError::UnknownCity(city.to_string()))?;

    Ok(CellAddress::for_record(
        sheet,
        layout.student_matched_teacher,
        student_index,
    ))
}

/// Writes the linked student of a teacher. An empty value unassigns.
pub async fn assign_teacher(
    store: &dyn RowStore,
    layout: &Layout,
    teacher_index: usize,
    value: &str,
) -> Result<CellAddress, DataError> {
    let address = teacher_assignment_cell(layout, teacher_index);
    store
        .update_cell(&address, value.to_string())
        .await
        .inspect_err(|e| error!("Failed to assign teacher at {address}: {e}"))?;
    Ok(address)
}

/// Writes the linked teacher of a student in the city's sheet. An empty value unassigns.
pub async fn assign_student(
    store: &dyn RowStore,
    layout: &Layout,
    student_index: usize,
    city: &str,
    value: &str,
) -> Result<CellAddress, DataError> {
    let address = student_assignment_cell(layout, student_index, city)?;
    store
        .update_cell(&address, value.to_string())
        .await
        .inspect_err(|e| error!("Failed to assign student at {address}: {e}"))?;
    Ok(address)
}

/// Records who held the opening call and what they learned, in one write.
pub async fn update_opening_call(
    store: &dyn RowStore,
    layout: &Layout,
    teacher_index: usize,
    coordinator_name: &str,
    insights: &str,
) -> Result<CellAddress, DataError> {
    let address = CellAddress::for_record(
        &layout.sheets.teachers,
        layout.teacher_opening_call,
        teacher_index,
    );
    store
        .update_cells(
            &address,
            vec![coordinator_name.to_string(), insights.to_string()],
        )
        .await
        .inspect_err(|e| error!("Failed to update opening call at {address}: {e}"))?;
    Ok(address)
}


#[cfg(test)]
mod tests {
    use super::fixtures::program;
    use super::*;
    use crate::status::TeacherStatus;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn snapshot_merges_city_sheets() {
        let store = program();
        let snapshot = load_snapshot(&store, &Layout::default()).await.unwrap();

        assert_eq!(snapshot.teachers.len(), 3);
        assert_eq!(snapshot.students.len(), 3);
        assert_eq!(snapshot.students[2].city, "כפר עזה");
        assert_eq!(snapshot.students[2].index, 0);
        assert_eq!(snapshot.matches.len(), 1);
        assert_eq!(
            snapshot.coordinator_by_email("RONIT@example.com").map(|c| c.name.as_str()),
            Some("רונית")
        );
        assert!(snapshot.student("כפר עזה", 0).is_some());
        assert!(snapshot.student("נחל עוז", 0).is_none());
    }

    #[tokio::test]
    async fn missing_sheet_fails_the_whole_load() {
        let store = MemoryStore::new();
        let err = load_snapshot(&store, &Layout::default()).await.unwrap_err();
        assert!(matches!(err, DataError::Store(StoreError::UnknownSheet(_))));
    }

    #[tokio::test]
    async fn assign_teacher_writes_one_cell_at_row_plus_two() {
        let store = program();
        let layout = Layout::default();

        let address = assign_teacher(&store, &layout, 1, "נועה לוי").await.unwrap();
        assert_eq!(address.to_string(), "'מורים'!AA3");
        assert_eq!(store.cell(&address).as_deref(), Some("נועה לוי"));

        let snapshot = load_snapshot(&store, &layout).await.unwrap();
        assert_eq!(snapshot.teachers[1].matched_student, "נועה לוי");
        assert_eq!(snapshot.teachers[0].matched_student, "");
        assert_eq!(snapshot.teachers[2].matched_student, "עומר");
    }

    #[tokio::test]
    async fn assign_student_targets_city_sheet() {
        let store = program();
        let layout = Layout::default();

        let address = assign_student(&store, &layout, 0, "כפר עזה", "דנה כהן")
            .await
            .unwrap();
        assert_eq!(address.to_string(), "'תלמידים - כפר עזה'!U2");

        let snapshot = load_snapshot(&store, &layout).await.unwrap();
        let shira = snapshot.student("כפר עזה", 0).unwrap();
        assert_eq!(shira.matched_teacher, "דנה כהן");
        assert_eq!(snapshot.student("נתיב העשרה", 0).unwrap().matched_teacher, "");

        let err = assign_student(&store, &layout, 0, "תל אביב", "x").await.unwrap_err();
        assert!(matches!(err, DataError::UnknownCity(_)));
    }

    #[tokio::test]
    async fn assign_then_clear_restores_fields() {
        let store = program();
        let layout = Layout::default();
        let before = load_snapshot(&store, &layout).await.unwrap().teachers[0].clone();

        assign_teacher(&store, &layout, 0, "נועה לוי").await.unwrap();
        assign_teacher(&store, &layout, 0, &before.matched_student).await.unwrap();

        let after = load_snapshot(&store, &layout).await.unwrap().teachers[0].clone();
        assert_eq!(after, before);
        assert_eq!(TeacherStatus::of(&after), TeacherStatus::of(&before));
    }

    #[tokio::test]
    async fn moved_assignment_column_reads_back() {
        let store = program();
        let mut sheets = crate::config::SheetLayout::default();
        sheets.columns.teacher_matched_student = "AB".to_string();
        let layout = Layout::resolve(sheets).unwrap();

        let address = assign_teacher(&store, &layout, 0, "נועה לוי").await.unwrap();
        assert_eq!(address.to_string(), "'מורים'!AB2");

        let snapshot = load_snapshot(&store, &layout).await.unwrap();
        assert_eq!(snapshot.teachers[0].matched_student, "נועה לוי");
        assert!(TeacherStatus::of(&snapshot.teachers[0]).is_assigned());
    }

    #[tokio::test]
    async fn opening_call_writes_adjacent_cells() {
        let store = program();
        let layout = Layout::default();

        let address = update_opening_call(&store, &layout, 1, "רונית", "מתאים לכיתה ח")
            .await
            .unwrap();
        assert_eq!(address.span(2), "'מורים'!X3:Y3");

        let snapshot = load_snapshot(&store, &layout).await.unwrap();
        assert_eq!(snapshot.teachers[1].opening_call_with, "רונית");
        assert_eq!(snapshot.teachers[1].opening_call_insights, "מתאים לכיתה ח");
    }
}
